//! Support library for the Aware firmware and hardware developer tools.
//!
//! Each module backs one standalone tool: fade lookup tables, IIR to biquad
//! conversion, capture-buffer dumps and PCB length matching. The tools share
//! nothing but the error type and the logging helper.

pub mod board;
pub mod capture;
pub mod filter;
pub mod lut;
pub mod math;
pub mod prelude;
pub mod telemetry;

pub use prelude::{ToolError, ToolResult};
