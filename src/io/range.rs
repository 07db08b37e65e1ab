//! Windowed view over another stream. Container back-ends hand these out for
//! entries stored at an offset inside the archive.

use async_trait::async_trait;

use super::IoStream;
use crate::error::{ErrorCode, Result};

/// Read-only sub-stream exposing `[start, start + len)` of `inner` as a
/// stream of its own.
pub struct RangeIo {
    inner: Box<dyn IoStream>,
    start: u64,
    len: u64,
    pos: u64,
}

impl RangeIo {
    pub fn new(inner: Box<dyn IoStream>, start: u64, len: u64) -> Self {
        Self { inner, start, len, pos: 0 }
    }
}

#[async_trait]
impl IoStream for RangeIo {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = self.len - self.pos;
        if avail == 0 {
            return Ok(0);
        }
        let take = (buf.len() as u64).min(avail) as usize;
        // The inner stream may be shared with other windows between calls,
        // so position it explicitly every time.
        self.inner.seek(self.start + self.pos).await?;
        let got = self.inner.read(&mut buf[..take]).await?;
        self.pos += got as u64;
        Ok(got)
    }

    async fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(ErrorCode::OpenForReading)
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len {
            return Err(ErrorCode::PastEof);
        }
        self.pos = pos;
        Ok(())
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.pos)
    }

    async fn length(&mut self) -> Result<u64> {
        Ok(self.len)
    }

    async fn duplicate(&self) -> Result<Box<dyn IoStream>> {
        let inner = self.inner.duplicate().await?;
        Ok(Box::new(Self { inner, start: self.start, len: self.len, pos: self.pos }))
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
