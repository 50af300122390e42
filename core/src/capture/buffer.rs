use serde::{Deserialize, Serialize};

use crate::capture::source::MemorySource;
use crate::math::stats::StatsHelper;
use crate::prelude::{ToolError, ToolResult};
use crate::telemetry::log::LogManager;

/// Where the firmware keeps its two tape channels in RAM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureLayout {
    pub left_address: u32,
    pub right_address: u32,
    /// Samples per channel.
    pub samples: usize,
    pub sample_rate: u32,
}

impl Default for CaptureLayout {
    fn default() -> Self {
        Self {
            left_address: 0x2400_0110,
            right_address: 0x2407_5410,
            samples: 240_000,
            sample_rate: 48_000,
        }
    }
}

impl CaptureLayout {
    pub fn channel_bytes(&self) -> ToolResult<usize> {
        self.samples
            .checked_mul(2)
            .ok_or_else(|| ToolError::InvalidInput("sample count overflows".into()))
    }

    pub fn validate(&self) -> ToolResult<()> {
        if self.samples == 0 {
            return Err(ToolError::InvalidInput("capture length is zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(ToolError::InvalidInput("sample rate is zero".into()));
        }
        Ok(())
    }
}

/// Per-channel level statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub peak: u16,
    pub rms: f64,
    pub clipped: usize,
}

impl ChannelSummary {
    fn of(samples: &[i16]) -> Self {
        Self {
            peak: StatsHelper::peak(samples),
            rms: StatsHelper::rms(samples),
            clipped: StatsHelper::clipped(samples),
        }
    }

    /// Peak level relative to 16-bit full scale.
    pub fn peak_dbfs(&self) -> f64 {
        if self.peak == 0 {
            f64::NEG_INFINITY
        } else {
            20.0 * (f64::from(self.peak) / 32768.0).log10()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub frames: usize,
    pub duration_s: f64,
    pub left: ChannelSummary,
    pub right: ChannelSummary,
}

/// Both tape channels read back from the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StereoCapture {
    pub left: Vec<i16>,
    pub right: Vec<i16>,
    pub sample_rate: u32,
}

impl StereoCapture {
    pub fn read(source: &mut dyn MemorySource, layout: &CaptureLayout) -> ToolResult<Self> {
        layout.validate()?;
        let logger = LogManager::new("dump-capture");
        let len = layout.channel_bytes()?;

        let mut raw = vec![0u8; len];
        source.read_block(layout.left_address, &mut raw)?;
        let left = decode_i16_le(&raw);
        logger.record(&format!(
            "read {} bytes at 0x{:08x} from {}",
            len,
            layout.left_address,
            source.describe()
        ));

        source.read_block(layout.right_address, &mut raw)?;
        let right = decode_i16_le(&raw);
        logger.record(&format!(
            "read {} bytes at 0x{:08x} from {}",
            len,
            layout.right_address,
            source.describe()
        ));

        Ok(Self {
            left,
            right,
            sample_rate: layout.sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[left, right]` pairs in time order.
    pub fn frames(&self) -> impl Iterator<Item = [i16; 2]> + '_ {
        self.left.iter().zip(&self.right).map(|(&l, &r)| [l, r])
    }

    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / f64::from(self.sample_rate)
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            frames: self.len(),
            duration_s: self.duration_s(),
            left: ChannelSummary::of(&self.left),
            right: ChannelSummary::of(&self.right),
        }
    }
}

fn decode_i16_le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
