use log::{debug, info, warn};

/// Thin wrapper over the `log` facade carrying the tool name as target prefix.
pub struct LogManager {
    tool: &'static str,
}

impl LogManager {
    pub fn new(tool: &'static str) -> Self {
        Self { tool }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.tool, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.tool, message);
    }

    pub fn trace(&self, message: &str) {
        debug!("[{}] {}", self.tool, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("awarecore")
    }
}
