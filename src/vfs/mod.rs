//! The virtual file system instance: mount table, open-handle registry, and
//! the public operation surface.

mod files;
mod mount;
mod namespace;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio::sync::Mutex;

pub use namespace::EnumerateAction;

use crate::allocator::{Allocator, DirectAllocator};
use crate::archive::{Archive, FileKind};
use crate::error::{ErrorCode, ErrorRegistry, Result};
use crate::file::OpenFile;
use crate::path::prefixes;
use crate::platform;

/// One mounted source: its archive, the external name it was mounted under,
/// and its place in the virtual tree.
pub(crate) struct MountRecord {
    pub(crate) archive: Box<dyn Archive>,
    /// External path or identifier as passed to mount; the dedup and
    /// reverse-lookup key.
    pub(crate) real_name: String,
    /// Sanitized interior path with a trailing `/`; `None` is the root.
    pub(crate) mount_point: Option<String>,
}

/// One open handle: direction, owning mount, and the file state behind its
/// own lock so handles never contend with each other.
pub(crate) struct FileSlot {
    pub(crate) for_reading: bool,
    pub(crate) mount: Arc<MountRecord>,
    pub(crate) file: Arc<Mutex<OpenFile>>,
}

/// Mount-table state guarded by the instance lock. Held across archive
/// calls during mount-table scans; the ordering semantics of the search
/// path serialize those scans by design of the API.
pub(crate) struct State {
    pub(crate) mounts: Vec<Arc<MountRecord>>,
    pub(crate) write_mount: Option<Arc<MountRecord>>,
}

/// An independent virtual file system.
///
/// Applications see one tree rooted at `/`. Lookups walk the ordered mount
/// list; earlier mounts shadow later ones. All operations are safe to call
/// from many tasks concurrently.
pub struct Vfs {
    pub(crate) state: Mutex<State>,
    pub(crate) files: DashMap<u64, FileSlot>,
    pub(crate) errors: ErrorRegistry,
    symlinks_permitted: AtomicBool,
    allocator: RwLock<Arc<dyn Allocator>>,
    base_dir: String,
    user_dir: String,
    pub(crate) next_id: AtomicU64,
}

impl Vfs {
    /// Create an instance. `argv0` is the fallback used to locate the
    /// running binary when the OS cannot report it.
    pub fn new(argv0: Option<&str>) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(State { mounts: Vec::new(), write_mount: None }),
            files: DashMap::new(),
            errors: ErrorRegistry::new(),
            symlinks_permitted: AtomicBool::new(false),
            allocator: RwLock::new(Arc::new(DirectAllocator)),
            base_dir: platform::base_dir(argv0)?,
            user_dir: platform::user_dir(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Directory containing the running binary, with a trailing separator.
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// The user's home directory, with a trailing separator.
    pub fn user_dir(&self) -> &str {
        &self.user_dir
    }

    /// Per-user writable directory for `org`/`app`, created on demand.
    pub async fn pref_dir(&self, org: &str, app: &str) -> Result<String> {
        self.note(platform::pref_dir(org, app).await)
    }

    /// Allow or forbid paths that traverse symbolic links inside mounts.
    /// Forbidden by default.
    pub fn permit_symbolic_links(&self, allow: bool) {
        self.symlinks_permitted.store(allow, Ordering::Release);
    }

    pub fn symbolic_links_permitted(&self) -> bool {
        self.symlinks_permitted.load(Ordering::Acquire)
    }

    /// Read and clear the calling task's last error code.
    pub fn last_error_code(&self) -> ErrorCode {
        self.errors.take()
    }

    /// Plant an error code in the calling task's slot, as an application
    /// callback would.
    pub fn set_error_code(&self, code: ErrorCode) {
        self.errors.record(code);
    }

    /// Replace the buffer allocation policy for subsequently opened
    /// handles.
    pub fn set_allocator(&self, allocator: Arc<dyn Allocator>) {
        *self.allocator.write().expect("allocator slot poisoned") = allocator;
    }

    pub fn allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator.read().expect("allocator slot poisoned"))
    }

    /// Close every handle (flushing writers best-effort) and drop every
    /// mount. The instance is reusable afterwards.
    pub async fn shutdown(&self) {
        let ids: Vec<u64> = self.files.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, slot)) = self.files.remove(&id) {
                let mut file = slot.file.lock().await;
                if !file.for_reading {
                    let _ = file.flush().await;
                    let _ = file.stream.flush().await;
                }
                if let Some(buf) = file.take_buffer() {
                    self.allocator().release(buf);
                }
            }
        }
        let mut state = self.state.lock().await;
        state.mounts.clear();
        state.write_mount = None;
        self.errors.clear();
    }

    /// Record a failure in the caller's error slot on the way out of a
    /// public operation.
    pub(crate) fn note<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(code) = &result {
            self.errors.record(*code);
        }
        result
    }

    /// Security scan for one (mount, archive-relative path) pair: refuse
    /// paths that traverse symbolic links while links are forbidden.
    ///
    /// Absence of any prefix passes the scan; the operation that follows
    /// reports its own not-found (and mkdir is about to create the missing
    /// tail anyway).
    pub(crate) async fn verify_path(&self, rec: &MountRecord, fname: &str) -> Result<()> {
        if self.symbolic_links_permitted() || !rec.archive.supports_symlinks() {
            return Ok(());
        }
        for prefix in prefixes(fname) {
            match rec.archive.stat(prefix).await {
                Ok(stat) if stat.kind == FileKind::Symlink => {
                    return Err(ErrorCode::SymlinkForbidden);
                }
                Ok(_) => {}
                Err(ErrorCode::NotFound) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
