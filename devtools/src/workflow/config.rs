use anyhow::Context;
use awarecore::capture::CaptureLayout;
use awarecore::filter::BiquadNames;
use awarecore::lut::{LutFormat, LutNames};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults for every tool; command-line flags override them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub lut: LutConfig,
    pub filter: FilterConfig,
    pub capture: CaptureConfig,
    pub board: BoardConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Table length; unset means the default of the chosen format.
    pub size: Option<usize>,
    pub format: LutFormat,
    pub names: LutNames,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub input: PathBuf,
    pub names: BiquadNames,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("coeffs.csv"),
            names: BiquadNames::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub layout: CaptureLayout,
    /// Output file stem.
    pub output: String,
    /// Target name for the debug probe, e.g. `STM32H743ZITx`.
    pub chip: Option<String>,
    /// Address of the first byte of a memory image; defaults to the left
    /// channel address.
    pub image_base: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            layout: CaptureLayout::default(),
            output: "tape_dump".to_string(),
            chip: None,
            image_base: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub board: Option<PathBuf>,
    pub first: String,
    pub second: String,
    pub tolerance_mm: Option<f64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board: None,
            first: "Net-(U2-A{n})".to_string(),
            second: "/FMC_A{n}".to_string(),
            tolerance_mm: None,
        }
    }
}

impl ToolsConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tools config {}", path_ref.display()))?;
        let config: ToolsConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing tools config {}", path_ref.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_firmware_constants() {
        let cfg = ToolsConfig::default();
        assert_eq!(cfg.lut.size, None);
        assert_eq!(cfg.lut.format, LutFormat::Block);
        assert_eq!(cfg.capture.layout.left_address, 0x2400_0110);
        assert_eq!(cfg.capture.output, "tape_dump");
        assert_eq!(cfg.board.second, "/FMC_A{n}");
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"lut:\n  size: 128\n  format: list\ncapture:\n  layout:\n    samples: 1024\n  chip: STM32H743ZITx\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ToolsConfig::load(&path).unwrap();
        assert_eq!(cfg.lut.size, Some(128));
        assert_eq!(cfg.lut.format, LutFormat::List);
        assert_eq!(cfg.lut.names.array, "fade_in_lut");
        assert_eq!(cfg.capture.layout.samples, 1024);
        assert_eq!(cfg.capture.layout.sample_rate, 48_000);
        assert_eq!(cfg.capture.chip.as_deref(), Some("STM32H743ZITx"));
        assert_eq!(cfg.filter.input, PathBuf::from("coeffs.csv"));
    }

    #[test]
    fn config_load_reports_bad_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"lut: [unclosed\n").unwrap();
        let path = temp.into_temp_path();
        assert!(ToolsConfig::load(&path).is_err());
    }
}
