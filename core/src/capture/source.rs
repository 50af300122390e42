use std::path::Path;

use crate::prelude::{ToolError, ToolResult};

/// Somewhere target memory can be read from: a live debug session or a saved
/// image of RAM.
pub trait MemorySource {
    fn read_block(&mut self, address: u32, out: &mut [u8]) -> ToolResult<()>;

    fn describe(&self) -> String;
}

/// Raw bytes of target memory starting at `base`, as written by a debugger's
/// binary memory dump.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    base: u32,
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn new(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    pub fn load(path: &Path, base: u32) -> ToolResult<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            ToolError::Source(format!("reading image {}: {}", path.display(), err))
        })?;
        Ok(Self::new(base, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl MemorySource for MemoryImage {
    fn read_block(&mut self, address: u32, out: &mut [u8]) -> ToolResult<()> {
        let start = u64::from(address);
        let end = start + out.len() as u64;
        let image_start = u64::from(self.base);
        let image_end = image_start + self.bytes.len() as u64;
        if start < image_start || end > image_end {
            return Err(ToolError::OutOfRange {
                address: start,
                end,
            });
        }
        let offset = (start - image_start) as usize;
        out.copy_from_slice(&self.bytes[offset..offset + out.len()]);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "memory image 0x{:08x}..0x{:08x}",
            self.base,
            u64::from(self.base) + self.len() as u64
        )
    }
}
