use anyhow::{bail, Context};
use awarecore::capture::{CaptureLayout, CaptureSummary, MemoryImage, MemorySource, StereoCapture};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use crate::commands::parse_address;
use crate::export;
use crate::workflow::config::CaptureConfig;

#[derive(Args, Debug, Default)]
pub struct DumpArgs {
    /// Dump a WAV file
    #[arg(long)]
    pub wav: bool,
    /// Dump a CSV file
    #[arg(long)]
    pub csv: bool,
    /// Print channel levels
    #[arg(long)]
    pub summary: bool,
    /// Output file stem; `.wav` and `.csv` are appended
    #[arg(long, short)]
    pub output: Option<String>,
    /// Read from a raw memory image instead of a live target
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Address of the image's first byte
    #[arg(long, value_parser = parse_address)]
    pub image_base: Option<u32>,
    /// Debug probe target name
    #[cfg(feature = "probe")]
    #[arg(long)]
    pub chip: Option<String>,
    #[arg(long, value_parser = parse_address)]
    pub left: Option<u32>,
    #[arg(long, value_parser = parse_address)]
    pub right: Option<u32>,
    /// Samples per channel
    #[arg(long)]
    pub samples: Option<usize>,
    #[arg(long)]
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outputs {
    wav: bool,
    csv: bool,
    summary: bool,
}

impl Outputs {
    fn select(args: &DumpArgs) -> Option<Self> {
        if args.wav || args.csv || args.summary {
            Some(Self {
                wav: args.wav,
                csv: args.csv,
                summary: args.summary,
            })
        } else {
            None
        }
    }
}

fn resolve_layout(args: &DumpArgs, config: &CaptureConfig) -> CaptureLayout {
    let base = &config.layout;
    CaptureLayout {
        left_address: args.left.unwrap_or(base.left_address),
        right_address: args.right.unwrap_or(base.right_address),
        samples: args.samples.unwrap_or(base.samples),
        sample_rate: args.sample_rate.unwrap_or(base.sample_rate),
    }
}

fn open_source(
    args: &DumpArgs,
    config: &CaptureConfig,
    layout: &CaptureLayout,
) -> anyhow::Result<Box<dyn MemorySource>> {
    if let Some(path) = &args.image {
        let base = args
            .image_base
            .or(config.image_base)
            .unwrap_or(layout.left_address);
        let image = MemoryImage::load(path, base)
            .with_context(|| format!("opening memory image {}", path.display()))?;
        return Ok(Box::new(image));
    }

    open_probe(args, config)
}

#[cfg(feature = "probe")]
fn open_probe(args: &DumpArgs, config: &CaptureConfig) -> anyhow::Result<Box<dyn MemorySource>> {
    let chip = args
        .chip
        .clone()
        .or_else(|| config.chip.clone())
        .context("no target chip: pass --chip or set capture.chip in the config")?;
    let source = crate::probe::ProbeSource::attach(&chip)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "probe"))]
fn open_probe(_args: &DumpArgs, _config: &CaptureConfig) -> anyhow::Result<Box<dyn MemorySource>> {
    bail!("no memory source: pass --image <file>, or build with the `probe` feature to read a live target")
}

fn with_extension(stem: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", stem, extension))
}

fn print_summary(summary: &CaptureSummary, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "{} frames, {:.3} s",
        summary.frames, summary.duration_s
    )?;
    for (name, channel) in [("Left", &summary.left), ("Right", &summary.right)] {
        writeln!(
            out,
            "{:<5} peak {:>5} ({:.1} dBFS), rms {:.1}, clipped {}",
            name,
            channel.peak,
            channel.peak_dbfs(),
            channel.rms,
            channel.clipped
        )?;
    }
    Ok(())
}

pub fn run(args: &DumpArgs, config: &CaptureConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let outputs = match Outputs::select(args) {
        Some(outputs) => outputs,
        None => {
            writeln!(out, "Nothing selected, defaulting to WAV + CSV + summary")?;
            Outputs {
                wav: true,
                csv: true,
                summary: true,
            }
        }
    };

    let layout = resolve_layout(args, config);
    let mut source = open_source(args, config, &layout)?;
    let capture = StereoCapture::read(source.as_mut(), &layout)
        .with_context(|| format!("reading capture buffers from {}", source.describe()))?;
    if capture.is_empty() {
        bail!("capture buffers are empty");
    }

    let stem = args.output.as_deref().unwrap_or(&config.output);
    if outputs.wav {
        let path = with_extension(stem, "wav");
        export::save_wav(&path, &capture)?;
        writeln!(
            out,
            "Saved {} with shape: ({}, 2)",
            path.display(),
            capture.len()
        )?;
    }
    if outputs.csv {
        let path = with_extension(stem, "csv");
        export::save_csv(&path, &capture)?;
        writeln!(
            out,
            "Saved {} with {} samples per channel",
            path.display(),
            capture.len()
        )?;
    }
    if outputs.summary {
        print_summary(&capture.summary(), out)?;
    }
    Ok(())
}
