use clap::{Parser, Subcommand};
use std::path::PathBuf;
use workflow::config::ToolsConfig;

mod commands;
mod export;
#[cfg(feature = "probe")]
mod probe;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Firmware support tools for the audio board")]
struct Args {
    /// Load tool defaults from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the Q15 quarter-sine fade-in table
    FadeLut(commands::lut::FadeLutArgs),
    /// Convert transfer-function coefficients to a CMSIS biquad cascade
    Biquads(commands::biquad::BiquadArgs),
    /// Dump the stereo capture buffers from target memory
    DumpCapture(commands::capture::DumpArgs),
    /// Report combined trace lengths of paired nets on a KiCad board
    LengthMatch(commands::length::LengthArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.config {
        ToolsConfig::load(path)?
    } else {
        ToolsConfig::default()
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        Command::FadeLut(cmd) => commands::lut::run(cmd, &config.lut, &mut out),
        Command::Biquads(cmd) => commands::biquad::run(cmd, &config.filter, &mut out),
        Command::DumpCapture(cmd) => commands::capture::run(cmd, &config.capture, &mut out),
        Command::LengthMatch(cmd) => commands::length::run(cmd, &config.board, &mut out),
    }
}
