//! Mount-table operations: the ordered search path, the write mount, and
//! opener resolution for new sources.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{MountRecord, Vfs};
use crate::archive::{format_snapshot, Archive, Claim, DirArchive};
use crate::error::{map_io_error, ErrorCode, Result};
use crate::file::Handle;
use crate::io::{HandleIo, IoStream, NativeIo};
use crate::path::{interior_of_mount_point, mount_suffix, sanitize};

/// `None`, `""` and `"/"` all mean the root; anything else sanitizes to an
/// interior path stored with a trailing `/`.
fn normalize_mount_point(mount_point: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = mount_point else {
        return Ok(None);
    };
    let mut clean = sanitize(raw)?;
    if clean.is_empty() {
        return Ok(None);
    }
    clean.push('/');
    Ok(Some(clean))
}

/// Resolve a source into an archive: real directories go to the DIR
/// back-end, anything else is offered to every registered format in
/// registration order. The first claim wins; a claimed-but-broken source
/// propagates that format's error.
async fn open_source(io: Option<Box<dyn IoStream>>, name: &str) -> Result<Box<dyn Archive>> {
    let io = match io {
        Some(io) => io,
        None => {
            let meta = tokio::fs::metadata(name).await.map_err(map_io_error)?;
            if meta.is_dir() {
                return Ok(Box::new(DirArchive::open(Path::new(name)).await?));
            }
            Box::new(NativeIo::open_read(Path::new(name)).await?) as Box<dyn IoStream>
        }
    };
    offer_to_formats(io, name).await
}

async fn offer_to_formats(mut io: Box<dyn IoStream>, name: &str) -> Result<Box<dyn Archive>> {
    for format in format_snapshot() {
        io.seek(0).await?;
        match format.try_open(io, name, false).await? {
            Claim::Mine(archive) => {
                debug!(name, claimed_by = format.name(), "archive claimed");
                return Ok(archive);
            }
            Claim::NotMine(back) => io = back,
        }
    }
    Err(ErrorCode::Unsupported)
}

impl Vfs {
    /// Add a real directory or archive file to the search path. Mounting a
    /// source that is already mounted is a silent success. `append` places
    /// the mount behind existing ones; otherwise it shadows them.
    pub async fn mount(&self, real: &str, mount_point: Option<&str>, append: bool) -> Result<()> {
        let result = self.mount_source(None, real, mount_point, append).await;
        self.note(result)
    }

    /// Mount an archive supplied as a stream. `name` stands in for the real
    /// path in the search path and must be unique among mounts.
    pub async fn mount_io(
        &self,
        io: Box<dyn IoStream>,
        name: &str,
        mount_point: Option<&str>,
        append: bool,
    ) -> Result<()> {
        let result = self.mount_source(Some(io), name, mount_point, append).await;
        self.note(result)
    }

    /// Mount an archive read through an already-open handle. The handle
    /// must stay open until the mount is removed.
    pub async fn mount_handle(
        &self,
        handle: Handle,
        name: &str,
        mount_point: Option<&str>,
        append: bool,
    ) -> Result<()> {
        let io: Box<dyn IoStream> = {
            let Some(slot) = self.files.get(&handle.0) else {
                return self.note(Err(ErrorCode::InvalidArgument));
            };
            Box::new(HandleIo::new(Arc::clone(&slot.file)))
        };
        let result = self.mount_source(Some(io), name, mount_point, append).await;
        self.note(result)
    }

    async fn mount_source(
        &self,
        io: Option<Box<dyn IoStream>>,
        name: &str,
        mount_point: Option<&str>,
        append: bool,
    ) -> Result<()> {
        let point = normalize_mount_point(mount_point)?;
        let mut state = self.state.lock().await;
        if state.mounts.iter().any(|rec| rec.real_name == name) {
            return Ok(());
        }
        let archive = open_source(io, name).await?;
        let rec = Arc::new(MountRecord {
            archive,
            real_name: name.to_owned(),
            mount_point: point,
        });
        debug!(name, point = rec.mount_point.as_deref().unwrap_or("/"), append, "mounted");
        if append {
            state.mounts.push(rec);
        } else {
            state.mounts.insert(0, rec);
        }
        Ok(())
    }

    /// Remove a mount by the name it was mounted under. Refused while any
    /// handle opened through it is still live.
    pub async fn unmount(&self, real: &str) -> Result<()> {
        let result = async {
            let mut state = self.state.lock().await;
            let at = state
                .mounts
                .iter()
                .position(|rec| rec.real_name == real)
                .ok_or(ErrorCode::NotMounted)?;
            let rec = Arc::clone(&state.mounts[at]);
            if self.files.iter().any(|slot| Arc::ptr_eq(&slot.mount, &rec)) {
                return Err(ErrorCode::FilesStillOpen);
            }
            state.mounts.remove(at);
            debug!(real, "unmounted");
            Ok(())
        }
        .await;
        self.note(result)
    }

    /// Names of the current mounts, in search order.
    pub async fn search_path(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.mounts.iter().map(|rec| rec.real_name.clone()).collect()
    }

    /// Where a mounted source is attached in the virtual tree. `"/"` for
    /// root mounts.
    pub async fn mount_point_of(&self, real: &str) -> Result<String> {
        let result = async {
            let state = self.state.lock().await;
            state
                .mounts
                .iter()
                .find(|rec| rec.real_name == real)
                .map(|rec| rec.mount_point.clone().unwrap_or_else(|| "/".to_owned()))
                .ok_or(ErrorCode::NotMounted)
        }
        .await;
        self.note(result)
    }

    /// Name of the first mount that resolves `path`, honoring search order.
    pub async fn real_dir(&self, path: &str) -> Result<String> {
        let result = self.real_dir_scan(path).await;
        self.note(result)
    }

    async fn real_dir_scan(&self, path: &str) -> Result<String> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        for rec in &state.mounts {
            if interior_of_mount_point(rec.mount_point.as_deref(), &fname) {
                return Ok(rec.real_name.clone());
            }
            let Some(suffix) = mount_suffix(rec.mount_point.as_deref(), &fname) else {
                continue;
            };
            if self.verify_path(rec, suffix).await.is_ok()
                && rec.archive.stat(suffix).await.is_ok()
            {
                return Ok(rec.real_name.clone());
            }
        }
        Err(ErrorCode::NotFound)
    }

    /// The directory all writes, mkdirs and deletes target. `None` disables
    /// writing. Refused while write handles are open.
    pub async fn set_write_dir(&self, dir: Option<&str>) -> Result<()> {
        let result = async {
            let mut state = self.state.lock().await;
            if self.files.iter().any(|slot| !slot.for_reading) {
                return Err(ErrorCode::FilesStillOpen);
            }
            state.write_mount = match dir {
                None => None,
                Some(real) => {
                    let archive = DirArchive::open(Path::new(real)).await?;
                    Some(Arc::new(MountRecord {
                        archive: Box::new(archive),
                        real_name: real.to_owned(),
                        mount_point: None,
                    }))
                }
            };
            debug!(dir = dir.unwrap_or("<none>"), "write dir set");
            Ok(())
        }
        .await;
        self.note(result)
    }

    pub async fn write_dir(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.write_mount.as_ref().map(|rec| rec.real_name.clone())
    }

    /// One-call setup: write dir in the per-user tree for `org`/`app`, that
    /// tree and the base dir on the search path, and any archives with the
    /// given extension found in them. Errors from the individual mounts are
    /// deliberately ignored; the cd-rom flag is accepted for compatibility
    /// and unused.
    pub async fn set_sane_config(
        &self,
        org: &str,
        app: &str,
        archive_ext: Option<&str>,
        _include_cdroms: bool,
        archives_first: bool,
    ) -> Result<()> {
        let result = async {
            let pref = crate::platform::pref_dir(org, app).await?;
            self.set_write_dir(Some(&pref)).await.map_err(|_| ErrorCode::NoWriteDir)?;

            let _ = self.mount(&pref, None, true).await;
            let base = self.base_dir().to_owned();
            let _ = self.mount(&base, None, true).await;

            if let Some(ext) = archive_ext {
                let names = self.enumerate_files("").await.unwrap_or_default();
                for name in names {
                    let matches = name
                        .rsplit_once('.')
                        .is_some_and(|(_, have)| have.eq_ignore_ascii_case(ext));
                    if !matches {
                        continue;
                    }
                    if let Ok(dir) = self.real_dir(&name).await {
                        let full = Path::new(&dir).join(&name);
                        let _ = self
                            .mount(&full.to_string_lossy(), None, !archives_first)
                            .await;
                    }
                }
            }
            Ok(())
        }
        .await;
        self.note(result)
    }
}
