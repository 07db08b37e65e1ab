//! [`IoStream`] over an already-open virtual file, used when an archive is
//! mounted from a handle instead of a real path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::IoStream;
use crate::error::Result;
use crate::file::OpenFile;

/// Reads pass through the handle's buffering layer; the handle must stay
/// open for as long as the mount lives.
pub(crate) struct HandleIo {
    file: Arc<Mutex<OpenFile>>,
}

impl HandleIo {
    pub(crate) fn new(file: Arc<Mutex<OpenFile>>) -> Self {
        Self { file }
    }
}

#[async_trait]
impl IoStream for HandleIo {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.lock().await.read_bytes(buf).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file.lock().await.write_bytes(buf).await
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        self.file.lock().await.seek(pos).await
    }

    async fn tell(&mut self) -> Result<u64> {
        self.file.lock().await.tell().await
    }

    async fn length(&mut self) -> Result<u64> {
        self.file.lock().await.length().await
    }

    async fn duplicate(&self) -> Result<Box<dyn IoStream>> {
        // Bypass the buffer: a duplicate is a raw view of the same bytes.
        self.file.lock().await.stream.duplicate().await
    }

    async fn flush(&mut self) -> Result<()> {
        self.file.lock().await.flush().await
    }
}
