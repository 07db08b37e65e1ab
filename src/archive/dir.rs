//! Native-directory back-end: maps the archiver contract straight onto the
//! host filesystem beneath a real prefix directory.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs;

use super::{Archive, FileKind, Stat};
use crate::error::{map_io_error, ErrorCode, Result};
use crate::io::{IoStream, NativeIo};

/// A real directory mounted into the virtual tree.
pub struct DirArchive {
    prefix: PathBuf,
}

impl DirArchive {
    /// Open `prefix` as an archive; it must name an existing directory.
    pub async fn open(prefix: &Path) -> Result<Self> {
        let meta = fs::metadata(prefix).await.map_err(map_io_error)?;
        if !meta.is_dir() {
            return Err(ErrorCode::NotAFile);
        }
        Ok(Self { prefix: prefix.to_path_buf() })
    }

    /// Real location of a sanitized archive-relative path. Joining segment
    /// by segment converts `/` to the platform separator.
    fn resolve(&self, path: &str) -> PathBuf {
        let mut real = self.prefix.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            real.push(segment);
        }
        real
    }
}

fn time_secs(time: std::io::Result<SystemTime>) -> i64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(-1)
}

#[cfg(unix)]
fn change_time(meta: &std::fs::Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    meta.ctime()
}

#[cfg(not(unix))]
fn change_time(meta: &std::fs::Metadata) -> i64 {
    time_secs(meta.created())
}

fn stat_from_metadata(meta: &std::fs::Metadata) -> Stat {
    let file_type = meta.file_type();
    let kind = if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_file() {
        FileKind::Regular
    } else {
        FileKind::Other
    };
    Stat {
        size: if kind == FileKind::Regular { meta.len() as i64 } else { -1 },
        mtime: time_secs(meta.modified()),
        ctime: change_time(meta),
        atime: time_secs(meta.accessed()),
        kind,
        readonly: meta.permissions().readonly(),
    }
}

#[async_trait]
impl Archive for DirArchive {
    fn supports_symlinks(&self) -> bool {
        true
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        let mut reader = fs::read_dir(self.resolve(path)).await.map_err(map_io_error)?;
        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(map_io_error)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn open_read(&self, path: &str) -> Result<Box<dyn IoStream>> {
        Ok(Box::new(NativeIo::open_read(&self.resolve(path)).await?))
    }

    async fn open_write(&self, path: &str) -> Result<Box<dyn IoStream>> {
        Ok(Box::new(NativeIo::open_write(&self.resolve(path)).await?))
    }

    async fn open_append(&self, path: &str) -> Result<Box<dyn IoStream>> {
        Ok(Box::new(NativeIo::open_append(&self.resolve(path)).await?))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let real = self.resolve(path);
        let meta = fs::symlink_metadata(&real).await.map_err(map_io_error)?;
        if meta.file_type().is_dir() {
            fs::remove_dir(&real).await.map_err(map_io_error)
        } else {
            fs::remove_file(&real).await.map_err(map_io_error)
        }
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        fs::create_dir(self.resolve(path)).await.map_err(map_io_error)
    }

    async fn stat(&self, path: &str) -> Result<Stat> {
        let meta = fs::symlink_metadata(self.resolve(path)).await.map_err(map_io_error)?;
        Ok(stat_from_metadata(&meta))
    }
}
