// src/process/lines.rs

use crate::error::Result;

/// Reassembles lines from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, calling `emit` for every line it completes.
    pub fn push<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        self.pending.extend_from_slice(chunk);
        let mut start = 0;
        while let Some(nl) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + nl;
            emit(strip_cr(&self.pending[start..end]))?;
            start = end + 1;
        }
        self.pending.drain(..start);
        Ok(())
    }

    /// Flush the unterminated tail, if any.
    pub fn finish<F>(self, mut emit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        if self.pending.is_empty() {
            return Ok(());
        }
        emit(strip_cr(&self.pending))
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
