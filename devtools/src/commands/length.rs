use anyhow::Context;
use awarecore::board::{match_lengths, Board, LengthReport, NetPattern};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use crate::workflow::config::BoardConfig;

#[derive(Args, Debug, Default)]
pub struct LengthArgs {
    /// KiCad board file (.kicad_pcb)
    #[arg(value_name = "BOARD")]
    pub board: Option<PathBuf>,
    /// Template of the first net in each pair, `{n}` marks the shared number
    #[arg(long)]
    pub first: Option<NetPattern>,
    /// Template of the second net in each pair
    #[arg(long)]
    pub second: Option<NetPattern>,
    /// Flag pairs more than this many millimetres shorter than the longest
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn print_report(
    report: &LengthReport,
    tolerance: Option<f64>,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    for pair in &report.pairs {
        writeln!(out, "{}", pair)?;
    }
    if report.pairs.is_empty() {
        writeln!(out, "No matching net pairs found")?;
        return Ok(());
    }
    writeln!(out, "Longest pair: {:.4} mm", report.longest_mm)?;
    if let Some(tolerance) = tolerance {
        let short = report.exceeding(tolerance);
        if short.is_empty() {
            writeln!(out, "All pairs within {:.4} mm", tolerance)?;
        }
        for pair in short {
            writeln!(
                out,
                "  {} / {} short by {:.4} mm",
                pair.first_net,
                pair.second_net,
                report.skew(pair)
            )?;
        }
    }
    Ok(())
}

pub fn run(args: &LengthArgs, config: &BoardConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let path = args
        .board
        .clone()
        .or_else(|| config.board.clone())
        .context("no board file: pass BOARD or set board.board in the config")?;
    let first = match &args.first {
        Some(pattern) => pattern.clone(),
        None => NetPattern::new(&config.first).context("board.first in config")?,
    };
    let second = match &args.second {
        Some(pattern) => pattern.clone(),
        None => NetPattern::new(&config.second).context("board.second in config")?,
    };
    let tolerance = args.tolerance.or(config.tolerance_mm);

    let board = Board::load(&path).with_context(|| format!("loading board {}", path.display()))?;
    let report = match_lengths(&board, &first, &second);

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report).context("serializing report")?;
        writeln!(out)?;
    } else {
        print_report(&report, tolerance, out)?;
    }
    Ok(())
}
