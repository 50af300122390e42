pub mod buffer;
pub mod source;

pub use buffer::{CaptureLayout, CaptureSummary, ChannelSummary, StereoCapture};
pub use source::{MemoryImage, MemorySource};
