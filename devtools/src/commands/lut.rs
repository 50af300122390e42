use anyhow::Context;
use awarecore::lut::{FadeLut, LutFormat};
use clap::{Args, ValueEnum};
use std::io::Write;
use std::path::PathBuf;

use crate::commands::emit;
use crate::workflow::config::LutConfig;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// C array with a length define, twelve values per line
    Block,
    /// One value per line
    List,
}

impl From<FormatArg> for LutFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Block => LutFormat::Block,
            FormatArg::List => LutFormat::List,
        }
    }
}

#[derive(Args, Debug)]
pub struct FadeLutArgs {
    /// Number of table entries
    #[arg(long)]
    pub size: Option<usize>,
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// Name of the generated array
    #[arg(long)]
    pub array: Option<String>,
    /// Name of the length define
    #[arg(long)]
    pub define: Option<String>,
    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &FadeLutArgs, config: &LutConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let format = args.format.map(LutFormat::from).unwrap_or(config.format);
    let size = args
        .size
        .or(config.size)
        .unwrap_or_else(|| format.default_size());
    let mut names = config.names.clone();
    if let Some(array) = &args.array {
        names.array = array.clone();
    }
    if let Some(define) = &args.define {
        names.length_define = define.clone();
    }

    let lut = FadeLut::quarter_sine(size).context("generating fade LUT")?;
    emit(&lut.render(format, &names), args.output.as_deref(), out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> FadeLutArgs {
        FadeLutArgs {
            size: None,
            format: None,
            array: None,
            define: None,
            output: None,
        }
    }

    #[test]
    fn run_uses_config_size() {
        let config = LutConfig {
            size: Some(5),
            ..Default::default()
        };
        let mut out = Vec::new();
        run(&args(), &config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("int16_t fade_in_lut[5] = {"));
    }

    #[test]
    fn flags_override_config() {
        let mut a = args();
        a.size = Some(3);
        a.format = Some(FormatArg::List);
        let mut out = Vec::new();
        run(&a, &LutConfig::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0,\n23170,\n32767,\n");
    }

    #[test]
    fn list_format_defaults_to_128_entries() {
        let mut a = args();
        a.format = Some(FormatArg::List);
        let mut out = Vec::new();
        run(&a, &LutConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 128);
        assert_eq!(text.lines().last(), Some("32767,"));
    }

    #[test]
    fn block_format_defaults_to_256_entries() {
        let mut out = Vec::new();
        run(&args(), &LutConfig::default(), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("int16_t fade_in_lut[256] = {"));
    }

    #[test]
    fn run_rejects_single_entry() {
        let mut a = args();
        a.size = Some(1);
        assert!(run(&a, &LutConfig::default(), &mut Vec::new()).is_err());
    }
}
