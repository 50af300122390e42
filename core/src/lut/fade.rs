use std::f64::consts::FRAC_PI_2;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::prelude::{ToolError, ToolResult};
use crate::telemetry::log::LogManager;

/// Full-scale Q15 value.
pub const Q15_MAX: f64 = 32767.0;

const VALUES_PER_LINE: usize = 12;

/// Layout of the emitted table text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LutFormat {
    /// Commented C array with a length define, twelve values per line.
    #[default]
    Block,
    /// One value per line, each followed by a comma.
    List,
}

impl LutFormat {
    /// Table length used when none is given: the crossfade table is 256
    /// entries, the equal-power list 128.
    pub fn default_size(self) -> usize {
        match self {
            LutFormat::Block => 256,
            LutFormat::List => 128,
        }
    }
}

/// Identifiers used in the generated C text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LutNames {
    pub length_define: String,
    pub array: String,
}

impl Default for LutNames {
    fn default() -> Self {
        Self {
            length_define: "FADE_LUT_LEN".to_string(),
            array: "fade_in_lut".to_string(),
        }
    }
}

/// Equal-power fade-in curve: a quarter sine from 0 to full scale in Q15.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FadeLut {
    values: Vec<i16>,
}

impl FadeLut {
    pub fn quarter_sine(size: usize) -> ToolResult<Self> {
        if size < 2 {
            return Err(ToolError::InvalidInput(format!(
                "fade table needs at least 2 entries, got {}",
                size
            )));
        }

        let last = (size - 1) as f64;
        let values = (0..size)
            .map(|i| {
                let fraction = i as f64 / last;
                ((fraction * FRAC_PI_2).sin() * Q15_MAX).round_ties_even() as i16
            })
            .collect();

        LogManager::new("fade-lut").record(&format!("generated quarter sine LUT of {}", size));
        Ok(Self { values })
    }

    pub fn values(&self) -> &[i16] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn render(&self, format: LutFormat, names: &LutNames) -> String {
        match format {
            LutFormat::Block => self.render_block(names),
            LutFormat::List => self.render_list(),
        }
    }

    fn render_block(&self, names: &LutNames) -> String {
        let size = self.values.len();
        let mut out = String::new();
        let _ = writeln!(out, "// Quarter Sine LUT - size {}", size);
        let _ = writeln!(out, "#define {} {} \n", names.length_define, size);
        let _ = writeln!(out, "int16_t {}[{}] = {{", names.array, size);
        for chunk in self.values.chunks(VALUES_PER_LINE) {
            let line = chunk
                .iter()
                .map(|v| format!("{:5}", v))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "    {},", line);
        }
        out.push_str("};\n");
        out
    }

    fn render_list(&self) -> String {
        self.values.iter().map(|v| format!("{},\n", v)).collect()
    }
}
