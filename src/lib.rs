//! packvfs --- a mount-ordered virtual file system.
//!
//! Applications see one tree rooted at `/`; the library resolves every
//! lookup against an ordered search path of mounted sources. A source is a
//! real directory or an archive container understood by a registered
//! back-end; earlier mounts shadow later ones, and all writes target one
//! designated write directory.
//!
//! ```no_run
//! use packvfs::Vfs;
//!
//! # async fn demo() -> packvfs::Result<()> {
//! let vfs = Vfs::new(None)?;
//! vfs.set_write_dir(Some("/tmp/save")).await?;
//! vfs.mount("/usr/share/game/base", None, true).await?;
//! vfs.mount("/usr/share/game/textures.pak", Some("gfx"), true).await?;
//!
//! let file = vfs.open_read("/gfx/wall.tga").await?;
//! let mut buf = vec![0u8; vfs.file_length(file).await? as usize];
//! vfs.read_bytes(file, &mut buf).await?;
//! vfs.close(file).await?;
//! # Ok(())
//! # }
//! ```

mod allocator;
mod archive;
mod config;
mod drives;
mod error;
mod file;
mod io;
mod path;
mod platform;
mod tree;
mod vfs;

pub use allocator::{Allocator, DirectAllocator, PoolAllocator};
pub use archive::{
    archiver_count, register_archiver, supported_archive_types, Archive, ArchiveFormat, Claim,
    DirArchive, FileKind, PakArchive, PakFormat, Stat,
};
pub use config::{MountSpec, Profile};
pub use drives::{deinit, drive, init, is_init, NUM_DRIVES};
pub use error::{map_io_error, message_for_code, ErrorCode, Result};
pub use file::Handle;
pub use io::{IoStream, MemoryIo, NativeIo, RangeIo};
pub use path::sanitize;
pub use platform::dir_separator;
pub use tree::{DirTree, TreeEntry};
pub use vfs::{EnumerateAction, Vfs};
