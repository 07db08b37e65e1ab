//! Namespace operations: metadata, enumeration, directory creation and
//! deletion.

use super::Vfs;
use crate::archive::{FileKind, Stat};
use crate::error::{ErrorCode, Result};
use crate::path::{interior_of_mount_point, mount_suffix, next_mount_segment, prefixes, sanitize};

/// Verdict returned by an enumeration callback for each entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnumerateAction {
    /// Keep going.
    Continue,
    /// Stop early; enumeration still reports success.
    Stop,
    /// Abort; enumeration fails with [`ErrorCode::AppCallback`].
    Error,
}

impl Vfs {
    /// Metadata for a virtual path, resolved against the first mount that
    /// knows it.
    pub async fn stat(&self, path: &str) -> Result<Stat> {
        let result = self.stat_scan(path).await;
        self.note(result)
    }

    async fn stat_scan(&self, path: &str) -> Result<Stat> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        if fname.is_empty() {
            // The root always exists; it is writable exactly when a write
            // directory is set.
            let mut stat = Stat::readonly_directory();
            stat.readonly = state.write_mount.is_none();
            return Ok(stat);
        }
        let mut failure = ErrorCode::NotFound;
        for rec in &state.mounts {
            if interior_of_mount_point(rec.mount_point.as_deref(), &fname) {
                return Ok(Stat::readonly_directory());
            }
            let Some(suffix) = mount_suffix(rec.mount_point.as_deref(), &fname) else {
                continue;
            };
            match self.verify_path(rec, suffix).await {
                Ok(()) => match rec.archive.stat(suffix).await {
                    Ok(stat) => return Ok(stat),
                    Err(ErrorCode::NotFound) => {}
                    Err(err) => return Err(err),
                },
                Err(err) => failure = err,
            }
        }
        Err(failure)
    }

    /// Whether a virtual path resolves at all.
    pub async fn exists(&self, path: &str) -> bool {
        self.stat(path).await.is_ok()
    }

    pub async fn is_directory(&self, path: &str) -> bool {
        matches!(self.stat(path).await, Ok(stat) if stat.kind == FileKind::Directory)
    }

    pub async fn is_symbolic_link(&self, path: &str) -> bool {
        matches!(self.stat(path).await, Ok(stat) if stat.kind == FileKind::Symlink)
    }

    /// Walk the immediate entries of a virtual directory across every mount
    /// in search order, invoking `cb(dir, name)` per entry. Duplicates
    /// across mounts are reported as often as they occur; see
    /// [`Vfs::enumerate_files`] for the deduplicated form.
    ///
    /// The callback must not call back into the instance.
    pub async fn enumerate<F>(&self, path: &str, mut cb: F) -> Result<()>
    where
        F: FnMut(&str, &str) -> EnumerateAction + Send,
    {
        let result = self.enumerate_scan(path, &mut cb).await;
        self.note(result)
    }

    async fn enumerate_scan(
        &self,
        path: &str,
        cb: &mut (dyn FnMut(&str, &str) -> EnumerateAction + Send),
    ) -> Result<()> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        for rec in &state.mounts {
            if interior_of_mount_point(rec.mount_point.as_deref(), &fname) {
                // The directory exists only because a mount point is nested
                // beneath it: synthesize its next segment.
                let point = rec.mount_point.as_deref().unwrap_or_default();
                match cb(path, next_mount_segment(point, &fname)) {
                    EnumerateAction::Continue => {}
                    EnumerateAction::Stop => return Ok(()),
                    EnumerateAction::Error => return Err(ErrorCode::AppCallback),
                }
                continue;
            }
            let Some(suffix) = mount_suffix(rec.mount_point.as_deref(), &fname) else {
                continue;
            };
            self.verify_path(rec, suffix).await?;
            match rec.archive.stat(suffix).await {
                Ok(stat) if stat.kind == FileKind::Directory => {}
                Ok(_) => continue,
                Err(ErrorCode::NotFound) => continue,
                Err(err) => return Err(err),
            }

            let filter_links =
                !self.symbolic_links_permitted() && rec.archive.supports_symlinks();
            for name in rec.archive.read_dir(suffix).await? {
                if filter_links {
                    let full = if suffix.is_empty() {
                        name.clone()
                    } else {
                        format!("{suffix}/{name}")
                    };
                    match rec.archive.stat(&full).await {
                        Ok(stat) if stat.kind == FileKind::Symlink => continue,
                        Ok(_) => {}
                        // A stat failure inside the filter outranks the
                        // callback protocol.
                        Err(err) => return Err(err),
                    }
                }
                match cb(path, &name) {
                    EnumerateAction::Continue => {}
                    EnumerateAction::Stop => return Ok(()),
                    EnumerateAction::Error => return Err(ErrorCode::AppCallback),
                }
            }
        }
        Ok(())
    }

    /// Sorted, deduplicated names of the entries in a virtual directory.
    pub async fn enumerate_files(&self, path: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        self.enumerate(path, |_, name| {
            if let Err(at) = names.binary_search_by(|have| have.as_str().cmp(name)) {
                names.insert(at, name.to_owned());
            }
            EnumerateAction::Continue
        })
        .await?;
        Ok(names)
    }

    /// Create a directory (and any missing parents) in the write
    /// directory.
    pub async fn mkdir(&self, path: &str) -> Result<()> {
        let result = self.mkdir_scan(path).await;
        self.note(result)
    }

    async fn mkdir_scan(&self, path: &str) -> Result<()> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        let rec = state.write_mount.as_ref().ok_or(ErrorCode::NoWriteDir)?;
        self.verify_path(rec, &fname).await?;

        // Only probe for existence until the first missing ancestor; every
        // segment after that is created unconditionally.
        let mut probing = true;
        for prefix in prefixes(&fname) {
            if probing {
                match rec.archive.stat(prefix).await {
                    Ok(stat) if stat.kind == FileKind::Directory => continue,
                    Ok(_) => {}
                    Err(ErrorCode::NotFound) => probing = false,
                    Err(err) => return Err(err),
                }
            }
            rec.archive.mkdir(prefix).await?;
        }
        Ok(())
    }

    /// Delete a file or empty directory from the write directory.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let result = self.delete_scan(path).await;
        self.note(result)
    }

    async fn delete_scan(&self, path: &str) -> Result<()> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        let rec = state.write_mount.as_ref().ok_or(ErrorCode::NoWriteDir)?;
        self.verify_path(rec, &fname).await?;
        rec.archive.remove(&fname).await
    }
}
