pub mod biquad;
pub mod capture;
pub mod length;
pub mod lut;

use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes generated text to `output` when given, otherwise to `out`.
pub fn emit(text: &str, output: Option<&Path>, out: &mut dyn Write) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => out.write_all(text.as_bytes()).context("writing to stdout")?,
    }
    Ok(())
}

/// Accepts `0x`-prefixed hex or plain decimal.
pub fn parse_address(text: &str) -> Result<u32, String> {
    let cleaned = text.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|err| format!("invalid address '{}': {}", text, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_address_accepts_hex_and_decimal() {
        assert_eq!(parse_address("0x2400_0110"), Ok(0x2400_0110));
        assert_eq!(parse_address("0X10"), Ok(16));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xZZ").is_err());
    }

    #[test]
    fn emit_writes_file_when_path_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lut.h");
        let mut stdout = Vec::new();
        emit("int x;\n", Some(&path), &mut stdout).unwrap();
        assert!(stdout.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "int x;\n");
    }
}
