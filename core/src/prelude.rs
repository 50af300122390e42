/// Common error type for the developer tools.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("address range 0x{address:08x}..0x{end:08x} outside of source")]
    OutOfRange { address: u64, end: u64 },
    #[error("memory source failure: {0}")]
    Source(String),
    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl ToolError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
