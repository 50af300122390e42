use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::filter::sos::SosMatrix;

/// Identifiers used in the generated coefficient block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BiquadNames {
    pub stages_define: String,
    pub array: String,
}

impl Default for BiquadNames {
    fn default() -> Self {
        Self {
            stages_define: "BIQUAD_CASCADE_NUM_STAGES".to_string(),
            array: "iir_coeffs".to_string(),
        }
    }
}

/// Biquad cascade in the CMSIS-DSP coefficient order
/// `{b0, b1, b2, -a1, -a2}` per stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CmsisBiquads {
    pub stages: Vec<[f64; 5]>,
}

impl From<&SosMatrix> for CmsisBiquads {
    fn from(sos: &SosMatrix) -> Self {
        let stages = sos
            .sections
            .iter()
            .map(|s| [s[0], s[1], s[2], -s[4], -s[5]])
            .collect();
        Self { stages }
    }
}

impl SosMatrix {
    pub fn to_cmsis(&self) -> CmsisBiquads {
        CmsisBiquads::from(self)
    }
}

impl CmsisBiquads {
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn render(&self, names: &BiquadNames) -> String {
        let define = &names.stages_define;
        let mut out = String::new();
        out.push_str(
            "// Coefficients for IIR filter in CMSIS-DSP format (b0, b1, b2, -a1, -a2)\n\n",
        );
        let _ = writeln!(out, "#define {} {}\n", define, self.stages.len());
        let _ = writeln!(out, "extern float32_t {}[{} * 5];\n\n", names.array, define);
        let _ = writeln!(out, "float32_t {}[{} * 5] = {{", names.array, define);
        for stage in &self.stages {
            let line = stage
                .iter()
                .map(|c| format!("{:.8}", c))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "    {} ,", line);
        }
        out.push_str("};\n");
        out
    }
}
