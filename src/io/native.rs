//! [`IoStream`] over a real file, backed by `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use super::IoStream;
use crate::error::{map_io_error, ErrorCode, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
    Append,
}

/// Native file stream. Remembers its path so [`IoStream::duplicate`] can
/// reopen the same file independently.
pub struct NativeIo {
    file: File,
    path: PathBuf,
    mode: Mode,
    pos: u64,
}

impl NativeIo {
    /// Open an existing file for reading.
    pub async fn open_read(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(map_io_error)?;
        Ok(Self { file, path: path.to_path_buf(), mode: Mode::Read, pos: 0 })
    }

    /// Create or truncate a file for writing.
    pub async fn open_write(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(map_io_error)?;
        Ok(Self { file, path: path.to_path_buf(), mode: Mode::Write, pos: 0 })
    }

    /// Open a file for appending, creating it if missing.
    pub async fn open_append(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(map_io_error)?;
        let pos = file.seek(std::io::SeekFrom::End(0)).await.map_err(map_io_error)?;
        Ok(Self { file, path: path.to_path_buf(), mode: Mode::Append, pos })
    }
}

#[async_trait]
impl IoStream for NativeIo {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let got = self.file.read(buf).await.map_err(map_io_error)?;
        self.pos += got as u64;
        Ok(got)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let put = self.file.write(buf).await.map_err(map_io_error)?;
        self.pos += put as u64;
        Ok(put)
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        self.file.seek(std::io::SeekFrom::Start(pos)).await.map_err(map_io_error)?;
        self.pos = pos;
        Ok(())
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.pos)
    }

    async fn length(&mut self) -> Result<u64> {
        let meta = self.file.metadata().await.map_err(map_io_error)?;
        Ok(meta.len())
    }

    async fn duplicate(&self) -> Result<Box<dyn IoStream>> {
        if self.mode != Mode::Read {
            return Err(ErrorCode::Unsupported);
        }
        let mut dup = NativeIo::open_read(&self.path).await?;
        dup.seek(self.pos).await?;
        Ok(Box::new(dup))
    }

    async fn flush(&mut self) -> Result<()> {
        self.file.flush().await.map_err(map_io_error)
    }
}
