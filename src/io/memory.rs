//! Read-only [`IoStream`] over an in-memory byte buffer, shared cheaply
//! between duplicates.

use std::sync::Arc;

use async_trait::async_trait;

use super::IoStream;
use crate::error::{ErrorCode, Result};

/// Stream over caller-supplied bytes. The usual source for mounting an
/// archive that never touches the disk.
pub struct MemoryIo {
    data: Arc<[u8]>,
    pos: usize,
}

impl MemoryIo {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into(), pos: 0 }
    }
}

#[async_trait]
impl IoStream for MemoryIo {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = self.data.len() - self.pos;
        let take = buf.len().min(avail);
        buf[..take].copy_from_slice(&self.data[self.pos..self.pos + take]);
        self.pos += take;
        Ok(take)
    }

    async fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(ErrorCode::OpenForReading)
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.data.len() as u64 {
            return Err(ErrorCode::PastEof);
        }
        self.pos = pos as usize;
        Ok(())
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    async fn length(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn duplicate(&self) -> Result<Box<dyn IoStream>> {
        Ok(Box::new(Self { data: Arc::clone(&self.data), pos: self.pos }))
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
