//! Back-end for the id Software `PACK` container: a 12-byte header pointing
//! at a flat directory of 64-byte entries, each a NUL-padded path plus the
//! little-endian offset and size of the stored bytes.

use byteorder::{ByteOrder, LittleEndian};
use tokio::sync::Mutex;

use async_trait::async_trait;

use super::{Archive, ArchiveFormat, Claim, FileKind, Stat};
use crate::error::{ErrorCode, Result};
use crate::io::{IoStream, RangeIo};
use crate::tree::DirTree;

const HEADER_LEN: usize = 12;
const ENTRY_LEN: usize = 64;
const NAME_LEN: usize = 56;
const MAGIC: &[u8; 4] = b"PACK";

#[derive(Debug, Copy, Clone)]
struct PakEntry {
    offset: u32,
    size: u32,
}

/// An opened `PACK` container. Read-only; every lookup runs against the
/// directory tree built at open time.
pub struct PakArchive {
    io: Mutex<Box<dyn IoStream>>,
    tree: DirTree<PakEntry>,
}

/// Recognizer for [`PakArchive`].
pub struct PakFormat;

fn entry_name(raw: &[u8]) -> Result<&str> {
    let cut = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let name = std::str::from_utf8(&raw[..cut]).map_err(|_| ErrorCode::Corrupt)?;
    if name.is_empty() {
        return Err(ErrorCode::Corrupt);
    }
    for segment in name.split('/') {
        match segment {
            "" | "." | ".." => return Err(ErrorCode::Corrupt),
            _ if segment.contains(['\\', ':']) => return Err(ErrorCode::Corrupt),
            _ => {}
        }
    }
    Ok(name)
}

async fn load_entries(io: &mut Box<dyn IoStream>) -> Result<DirTree<PakEntry>> {
    let mut header = [0u8; HEADER_LEN];
    io.read_exact(&mut header).await?;
    let dir_offset = LittleEndian::read_u32(&header[4..8]);
    let dir_len = LittleEndian::read_u32(&header[8..12]) as usize;
    if dir_len % ENTRY_LEN != 0 {
        return Err(ErrorCode::Corrupt);
    }
    let total = io.length().await?;
    if dir_offset as u64 > total || dir_len as u64 > total - dir_offset as u64 {
        return Err(ErrorCode::Corrupt);
    }

    let mut directory = vec![0u8; dir_len];
    io.seek(dir_offset as u64).await?;
    io.read_exact(&mut directory).await?;

    let mut tree = DirTree::new();
    for raw in directory.chunks_exact(ENTRY_LEN) {
        let name = entry_name(&raw[..NAME_LEN])?;
        let offset = LittleEndian::read_u32(&raw[NAME_LEN..NAME_LEN + 4]);
        let size = LittleEndian::read_u32(&raw[NAME_LEN + 4..NAME_LEN + 8]);
        tree.add_file(name, PakEntry { offset, size })?;
    }
    Ok(tree)
}

#[async_trait]
impl ArchiveFormat for PakFormat {
    fn name(&self) -> &'static str {
        "PAK"
    }

    fn extension(&self) -> &'static str {
        "pak"
    }

    fn description(&self) -> &'static str {
        "id Software PACK container"
    }

    async fn try_open(
        &self,
        mut io: Box<dyn IoStream>,
        name: &str,
        for_writing: bool,
    ) -> Result<Claim> {
        let mut magic = [0u8; 4];
        let mut got = 0;
        while got < magic.len() {
            let n = io.read(&mut magic[got..]).await?;
            if n == 0 {
                break;
            }
            got += n;
        }
        if got < magic.len() || &magic != MAGIC {
            return Ok(Claim::NotMine(io));
        }

        // The magic matched; from here on failures are ours to report.
        if for_writing {
            return Err(ErrorCode::ReadOnly);
        }
        io.seek(0).await?;
        let tree = load_entries(&mut io).await?;
        tracing::debug!(name, entries = tree.len(), "opened PAK archive");
        Ok(Claim::Mine(Box::new(PakArchive { io: Mutex::new(io), tree })))
    }
}

#[async_trait]
impl Archive for PakArchive {
    fn supports_symlinks(&self) -> bool {
        false
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        self.tree.read_dir(path).ok_or(ErrorCode::NotFound)
    }

    async fn open_read(&self, path: &str) -> Result<Box<dyn IoStream>> {
        let entry = self.tree.find(path).ok_or(ErrorCode::NotFound)?;
        let Some(&PakEntry { offset, size }) = entry.payload() else {
            return Err(ErrorCode::NotAFile);
        };
        let dup = self.io.lock().await.duplicate().await?;
        Ok(Box::new(RangeIo::new(dup, offset as u64, size as u64)))
    }

    async fn open_write(&self, _path: &str) -> Result<Box<dyn IoStream>> {
        Err(ErrorCode::ReadOnly)
    }

    async fn open_append(&self, _path: &str) -> Result<Box<dyn IoStream>> {
        Err(ErrorCode::ReadOnly)
    }

    async fn remove(&self, _path: &str) -> Result<()> {
        Err(ErrorCode::ReadOnly)
    }

    async fn mkdir(&self, _path: &str) -> Result<()> {
        Err(ErrorCode::ReadOnly)
    }

    async fn stat(&self, path: &str) -> Result<Stat> {
        let entry = self.tree.find(path).ok_or(ErrorCode::NotFound)?;
        match entry.payload() {
            Some(&PakEntry { size, .. }) => Ok(Stat {
                size: size as i64,
                mtime: -1,
                ctime: -1,
                atime: -1,
                kind: FileKind::Regular,
                readonly: true,
            }),
            None => Ok(Stat::readonly_directory()),
        }
    }
}
