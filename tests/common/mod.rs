#![allow(dead_code)]

use std::path::PathBuf;

use byteorder::{LittleEndian, WriteBytesExt};
use packvfs::{Handle, Vfs};
use tempfile::TempDir;

pub struct Fixture {
    pub tempdir: TempDir,
    pub vfs: Vfs,
}

impl Fixture {
    pub fn new() -> Self {
        let tempdir = TempDir::new().expect("create temp dir");
        let vfs = Vfs::new(None).expect("create instance");
        Self { tempdir, vfs }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.tempdir.path().join(name)
    }

    pub fn path_str(&self, name: &str) -> String {
        self.path(name).to_string_lossy().into_owned()
    }

    pub fn root_str(&self) -> String {
        self.tempdir.path().to_string_lossy().into_owned()
    }

    pub fn write_file(&self, name: &str, data: &[u8]) {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parents");
        }
        std::fs::write(path, data).expect("write fixture file");
    }

    pub fn create_dir(&self, name: &str) {
        std::fs::create_dir_all(self.path(name)).expect("create fixture dir");
    }

    pub async fn mount_root(&self) {
        self.vfs.mount(&self.root_str(), None, true).await.expect("mount fixture root");
    }

    pub async fn use_as_write_dir(&self) {
        self.vfs.set_write_dir(Some(&self.root_str())).await.expect("set write dir");
    }
}

/// Read a whole virtual file through a handle, in deliberately odd chunks.
pub async fn read_all(vfs: &Vfs, handle: Handle) -> Vec<u8> {
    let mut out = Vec::new();
    let mut chunk = [0u8; 7];
    loop {
        let got = vfs.read_bytes(handle, &mut chunk).await.expect("read chunk");
        if got == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..got]);
    }
    out
}

/// Open, slurp and close a virtual file.
pub async fn slurp(vfs: &Vfs, path: &str) -> Vec<u8> {
    let handle = vfs.open_read(path).await.expect("open for reading");
    let data = read_all(vfs, handle).await;
    vfs.close(handle).await.expect("close");
    data
}

/// Build an id `PACK` container image holding the given entries.
pub fn pak_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    const HEADER_LEN: usize = 12;
    const ENTRY_LEN: usize = 64;
    const NAME_LEN: usize = 56;

    let mut body = Vec::new();
    let mut records = Vec::new();
    for (name, content) in entries {
        records.push((*name, HEADER_LEN + body.len(), content.len()));
        body.extend_from_slice(content);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"PACK");
    out.write_u32::<LittleEndian>((HEADER_LEN + body.len()) as u32).unwrap();
    out.write_u32::<LittleEndian>((records.len() * ENTRY_LEN) as u32).unwrap();
    out.extend_from_slice(&body);
    for (name, offset, size) in records {
        let mut raw = [0u8; NAME_LEN];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&raw);
        out.write_u32::<LittleEndian>(offset as u32).unwrap();
        out.write_u32::<LittleEndian>(size as u32).unwrap();
    }
    out
}
