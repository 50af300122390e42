//! Live target memory through a debug probe.

use anyhow::Context;
use awarecore::capture::MemorySource;
use awarecore::prelude::{ToolError, ToolResult};
use probe_rs::{MemoryInterface, Permissions, Session};

pub struct ProbeSource {
    session: Session,
    chip: String,
}

impl ProbeSource {
    /// Attaches to the first connected probe and the given target.
    pub fn attach(chip: &str) -> anyhow::Result<Self> {
        let session = Session::auto_attach(chip, Permissions::default())
            .with_context(|| format!("attaching to {} through the first debug probe", chip))?;
        log::info!("attached to {}", chip);
        Ok(Self {
            session,
            chip: chip.to_string(),
        })
    }
}

impl MemorySource for ProbeSource {
    fn read_block(&mut self, address: u32, out: &mut [u8]) -> ToolResult<()> {
        let mut core = self
            .session
            .core(0)
            .map_err(|err| ToolError::Source(err.to_string()))?;
        core.read_8(u64::from(address), out)
            .map_err(|err| ToolError::Source(format!("reading 0x{:08x}: {}", address, err)))
    }

    fn describe(&self) -> String {
        format!("debug probe session on {}", self.chip)
    }
}
