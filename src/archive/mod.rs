//! The contract archive back-ends honor, and the process-level registry of
//! known archive formats.

mod dir;
mod pak;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use async_trait::async_trait;

pub use dir::DirArchive;
pub use pak::{PakArchive, PakFormat};

use crate::error::Result;
use crate::io::IoStream;

/// Kind of a namespace entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

/// Metadata for one entry. Sizes and times are `-1` when the back-end does
/// not know them.
#[derive(Debug, Copy, Clone)]
pub struct Stat {
    /// Size in bytes; `-1` for directories and unknown sizes.
    pub size: i64,
    /// Modification time, seconds since the epoch; `-1` if unknown.
    pub mtime: i64,
    /// Creation time, seconds since the epoch; `-1` if unknown.
    pub ctime: i64,
    /// Access time, seconds since the epoch; `-1` if unknown.
    pub atime: i64,
    pub kind: FileKind,
    pub readonly: bool,
}

impl Stat {
    /// A read-only directory with unknown times; what container back-ends
    /// and mount-point synthesis report for directories.
    pub fn readonly_directory() -> Self {
        Self { size: -1, mtime: -1, ctime: -1, atime: -1, kind: FileKind::Directory, readonly: true }
    }
}

/// One mounted container. All paths are archive-relative, already
/// sanitized; back-ends trust them.
///
/// Dropping the archive releases its resources, including the stream it was
/// opened over.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Whether entries of this archive can be symbolic links. Back-ends
    /// that return `false` are exempt from link verification scans.
    fn supports_symlinks(&self) -> bool;

    /// Names of the immediate children of `path`, as single segments.
    async fn read_dir(&self, path: &str) -> Result<Vec<String>>;

    async fn open_read(&self, path: &str) -> Result<Box<dyn IoStream>>;

    async fn open_write(&self, path: &str) -> Result<Box<dyn IoStream>>;

    async fn open_append(&self, path: &str) -> Result<Box<dyn IoStream>>;

    /// Delete a file or empty directory.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Create a single directory; parents must already exist.
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Metadata for `path`. Does not follow symbolic links, so `kind` can
    /// report [`FileKind::Symlink`].
    async fn stat(&self, path: &str) -> Result<Stat>;
}

/// Outcome of offering a stream to an [`ArchiveFormat`].
pub enum Claim {
    /// The format recognized and opened the content.
    Mine(Box<dyn Archive>),
    /// Not this format; the stream is handed back for the next candidate.
    NotMine(Box<dyn IoStream>),
}

/// A registered archive format, able to recognize and open containers.
#[async_trait]
pub trait ArchiveFormat: Send + Sync {
    /// Short format tag, e.g. `"PAK"`.
    fn name(&self) -> &'static str;

    /// Conventional file extension, lower case, without the dot.
    fn extension(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Inspect `io` (positioned at the start) and claim it if recognized.
    /// An `Err` means the content is this format but unusable, and aborts
    /// the candidate scan with that error.
    async fn try_open(
        &self,
        io: Box<dyn IoStream>,
        name: &str,
        for_writing: bool,
    ) -> Result<Claim>;
}

static FORMATS: OnceLock<RwLock<Vec<Arc<dyn ArchiveFormat>>>> = OnceLock::new();
static FORMAT_COUNT: AtomicUsize = AtomicUsize::new(0);

fn formats() -> &'static RwLock<Vec<Arc<dyn ArchiveFormat>>> {
    FORMATS.get_or_init(|| {
        FORMAT_COUNT.store(1, Ordering::Release);
        RwLock::new(vec![Arc::new(PakFormat)])
    })
}

/// Register an archive format. Later mounts offer unrecognized streams to
/// every registered format in registration order.
pub fn register_archiver(format: Arc<dyn ArchiveFormat>) {
    let mut table = formats().write().expect("format registry poisoned");
    table.push(format);
    FORMAT_COUNT.store(table.len(), Ordering::Release);
}

/// Number of registered formats.
pub fn archiver_count() -> usize {
    formats();
    FORMAT_COUNT.load(Ordering::Acquire)
}

/// `(extension, description)` of every registered format.
pub fn supported_archive_types() -> Vec<(&'static str, &'static str)> {
    let table = formats().read().expect("format registry poisoned");
    table.iter().map(|f| (f.extension(), f.description())).collect()
}

/// Snapshot of the registry for a candidate scan.
pub(crate) fn format_snapshot() -> Vec<Arc<dyn ArchiveFormat>> {
    formats().read().expect("format registry poisoned").clone()
}
