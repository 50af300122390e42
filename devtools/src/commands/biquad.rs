use anyhow::Context;
use awarecore::filter::{tf_to_sos, SosMatrix, TransferFunction};
use clap::Args;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;

use crate::commands::emit;
use crate::workflow::config::FilterConfig;

/// Cascade products further than this from the input get a warning.
const RECONSTRUCTION_TOLERANCE: f64 = 1e-6;

#[derive(Args, Debug, Default)]
pub struct BiquadArgs {
    /// CSV with a header row, numerator in column one and denominator in column two
    #[arg(value_name = "COEFFS_CSV")]
    pub input: Option<PathBuf>,
    /// Name of the generated coefficient array
    #[arg(long)]
    pub array: Option<String>,
    /// Name of the stage-count define
    #[arg(long)]
    pub define: Option<String>,
    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Print the second-order sections before the coefficient block
    #[arg(long)]
    pub show_sos: bool,
}

fn print_sos(sos: &SosMatrix, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "SOS matrix:")?;
    for section in &sos.sections {
        let row: Vec<String> = section.iter().map(|c| format!("{:.8}", c)).collect();
        writeln!(out, "[{}]", row.join(", "))?;
    }
    Ok(())
}

pub fn run(args: &BiquadArgs, config: &FilterConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let input = args.input.clone().unwrap_or_else(|| config.input.clone());
    let mut names = config.names.clone();
    if let Some(array) = &args.array {
        names.array = array.clone();
    }
    if let Some(define) = &args.define {
        names.stages_define = define.clone();
    }

    let tf = TransferFunction::load(&input)
        .with_context(|| format!("loading coefficients from {}", input.display()))?;
    info!("order {} filter from {}", tf.order(), input.display());

    let sos = tf_to_sos(&tf).context("converting to second-order sections")?;
    if args.show_sos {
        print_sos(&sos, out)?;
    } else {
        info!("{} sections: {:?}", sos.len(), sos.sections);
    }

    let error = sos
        .reconstruction_error(&tf)
        .context("checking the section cascade")?;
    if error > RECONSTRUCTION_TOLERANCE {
        warn!("section cascade deviates from the input by {:.3e}", error);
    } else {
        info!("section cascade matches the input within {:.3e}", error);
    }

    emit(&sos.to_cmsis().render(&names), args.output.as_deref(), out)
}
