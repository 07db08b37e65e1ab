//! Error codes shared by every public operation, and the per-caller
//! last-error registry.

use std::io;

use dashmap::DashMap;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

/// Result of virtual file system operations.
pub type Result<T> = std::result::Result<T, ErrorCode>;

/// Stable error code set.
///
/// The numeric discriminants are the public contract; [`ErrorCode::message`]
/// provides a readable English description for each code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ErrorCode {
    /// Success; never carried by an `Err`.
    Ok = 0,
    /// An error not covered by any other code.
    OtherError = 1,
    /// A memory allocation failed.
    OutOfMemory = 2,
    /// The instance is not initialized.
    NotInitialized = 3,
    /// The instance is already initialized.
    IsInitialized = 4,
    /// The path of the running binary could not be determined.
    Argv0IsNull = 5,
    /// The operation or archive format is not supported.
    Unsupported = 6,
    /// An attempt was made to move past the end of a file.
    PastEof = 7,
    /// Files are still open, so the operation was refused.
    FilesStillOpen = 8,
    /// An argument was invalid.
    InvalidArgument = 9,
    /// No mount with the given name exists.
    NotMounted = 10,
    /// No such file or directory in any mounted source.
    NotFound = 11,
    /// The path crosses a symbolic link while links are forbidden.
    SymlinkForbidden = 12,
    /// No write directory has been set.
    NoWriteDir = 13,
    /// The handle is open for reading, so the write-side operation failed.
    OpenForReading = 14,
    /// The handle is open for writing, so the read-side operation failed.
    OpenForWriting = 15,
    /// The path names a directory where a file was required.
    NotAFile = 16,
    /// The source is read-only and refuses modification.
    ReadOnly = 17,
    /// The archive is corrupt.
    Corrupt = 18,
    /// A symbolic link loop was detected.
    SymlinkLoop = 19,
    /// A hard I/O error occurred.
    Io = 20,
    /// Permission was denied by the host.
    Permission = 21,
    /// No space left on the device.
    NoSpace = 22,
    /// The virtual path contains forbidden bytes or segments.
    BadFilename = 23,
    /// The resource is busy.
    Busy = 24,
    /// The directory is not empty.
    DirNotEmpty = 25,
    /// An unspecified operating system error occurred.
    OsError = 26,
    /// The entry already exists.
    Duplicate = 27,
    /// A password was required or wrong.
    BadPassword = 28,
    /// An application enumeration callback reported failure.
    AppCallback = 29,
}

impl ErrorCode {
    /// Readable English description of the code. The code itself is the
    /// stable contract; this text is not.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Ok => "no error",
            ErrorCode::OtherError => "unknown error",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::NotInitialized => "not initialized",
            ErrorCode::IsInitialized => "already initialized",
            ErrorCode::Argv0IsNull => "could not locate the running binary",
            ErrorCode::Unsupported => "unsupported",
            ErrorCode::PastEof => "past end of file",
            ErrorCode::FilesStillOpen => "files still open",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::NotMounted => "not mounted",
            ErrorCode::NotFound => "no such file or directory",
            ErrorCode::SymlinkForbidden => "symbolic link forbidden",
            ErrorCode::NoWriteDir => "no write directory set",
            ErrorCode::OpenForReading => "file open for reading",
            ErrorCode::OpenForWriting => "file open for writing",
            ErrorCode::NotAFile => "not a file",
            ErrorCode::ReadOnly => "read-only file system",
            ErrorCode::Corrupt => "corrupt archive",
            ErrorCode::SymlinkLoop => "symbolic link loop",
            ErrorCode::Io => "i/o error",
            ErrorCode::Permission => "permission denied",
            ErrorCode::NoSpace => "no space left on device",
            ErrorCode::BadFilename => "bad file name",
            ErrorCode::Busy => "busy",
            ErrorCode::DirNotEmpty => "directory not empty",
            ErrorCode::OsError => "operating system error",
            ErrorCode::Duplicate => "entry already exists",
            ErrorCode::BadPassword => "bad password",
            ErrorCode::AppCallback => "application callback reported failure",
        }
    }

    /// Numeric value of the code.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ErrorCode {}

/// Look up the message for a numeric code. `None` for unknown codes.
pub fn message_for_code(code: u32) -> Option<&'static str> {
    ErrorCode::from_u32(code).map(ErrorCode::message)
}

/// Map a host `io::Error` to the closest error code.
pub fn map_io_error(err: io::Error) -> ErrorCode {
    use io::ErrorKind::*;
    // `ErrorKind::FilesystemLoop` is still behind the unstable `io_error_more`
    // feature on this toolchain, so detect ELOOP via the raw OS error instead.
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::ELOOP) {
        return ErrorCode::SymlinkLoop;
    }
    match err.kind() {
        // A missing component and a non-directory component both mean the
        // path does not resolve in this source.
        NotFound | NotADirectory => ErrorCode::NotFound,
        IsADirectory => ErrorCode::NotAFile,
        PermissionDenied => ErrorCode::Permission,
        AlreadyExists => ErrorCode::Duplicate,
        InvalidInput | InvalidData => ErrorCode::InvalidArgument,
        ReadOnlyFilesystem => ErrorCode::ReadOnly,
        DirectoryNotEmpty => ErrorCode::DirNotEmpty,
        ResourceBusy => ErrorCode::Busy,
        StorageFull => ErrorCode::NoSpace,
        OutOfMemory => ErrorCode::OutOfMemory,
        UnexpectedEof => ErrorCode::PastEof,
        _ => ErrorCode::Io,
    }
}

/// Identity of the caller of a public operation: the current tokio task, or
/// the OS thread for callers outside a runtime task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CallerId {
    Task(tokio::task::Id),
    Thread(std::thread::ThreadId),
}

impl CallerId {
    pub(crate) fn current() -> Self {
        match tokio::task::try_id() {
            Some(id) => CallerId::Task(id),
            None => CallerId::Thread(std::thread::current().id()),
        }
    }
}

/// Per-caller last-error slots for one instance.
#[derive(Debug, Default)]
pub(crate) struct ErrorRegistry {
    slots: DashMap<CallerId, ErrorCode>,
}

impl ErrorRegistry {
    pub(crate) fn new() -> Self {
        Self { slots: DashMap::new() }
    }

    /// Store `code` in the calling task's slot.
    pub(crate) fn record(&self, code: ErrorCode) {
        self.slots.insert(CallerId::current(), code);
    }

    /// Read and clear the calling task's slot. [`ErrorCode::Ok`] if empty.
    pub(crate) fn take(&self) -> ErrorCode {
        self.slots.remove(&CallerId::current()).map(|(_, code)| code).unwrap_or(ErrorCode::Ok)
    }

    /// Drop every slot. Used at instance teardown.
    pub(crate) fn clear(&self) {
        self.slots.clear();
    }
}
