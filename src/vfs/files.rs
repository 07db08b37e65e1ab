//! Handle-oriented file operations.
//!
//! Opening scans the mount table under the instance lock; everything that
//! acts on a single open handle locks only that handle's slot, so traffic
//! on different handles proceeds concurrently.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::trace;

use super::{FileSlot, Vfs};
use crate::error::{ErrorCode, Result};
use crate::file::{Handle, OpenFile};
use crate::path::{mount_suffix, sanitize};

impl Vfs {
    /// Open a file for reading. Mounts are scanned in search order; the
    /// first one that resolves the path wins.
    pub async fn open_read(&self, path: &str) -> Result<Handle> {
        let result = self.open_read_scan(path).await;
        self.note(result)
    }

    async fn open_read_scan(&self, path: &str) -> Result<Handle> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        let mut failure = ErrorCode::NotFound;
        for rec in &state.mounts {
            let Some(suffix) = mount_suffix(rec.mount_point.as_deref(), &fname) else {
                continue;
            };
            let attempt = match self.verify_path(rec, suffix).await {
                Ok(()) => rec.archive.open_read(suffix).await,
                Err(err) => Err(err),
            };
            match attempt {
                Ok(stream) => {
                    let id = self.register(FileSlot {
                        for_reading: true,
                        mount: Arc::clone(rec),
                        file: Arc::new(Mutex::new(OpenFile::new(stream, true))),
                    });
                    trace!(path, id, "opened for reading");
                    return Ok(Handle(id));
                }
                Err(err) if err != ErrorCode::NotFound => failure = err,
                Err(_) => {}
            }
        }
        Err(failure)
    }

    /// Create or truncate a file in the write directory.
    pub async fn open_write(&self, path: &str) -> Result<Handle> {
        let result = self.open_write_scan(path, false).await;
        self.note(result)
    }

    /// Open a file in the write directory positioned at its end, creating
    /// it if missing.
    pub async fn open_append(&self, path: &str) -> Result<Handle> {
        let result = self.open_write_scan(path, true).await;
        self.note(result)
    }

    async fn open_write_scan(&self, path: &str, appending: bool) -> Result<Handle> {
        let fname = sanitize(path)?;
        let state = self.state.lock().await;
        let rec = state.write_mount.as_ref().ok_or(ErrorCode::NoWriteDir)?;
        self.verify_path(rec, &fname).await?;
        let stream = if appending {
            rec.archive.open_append(&fname).await?
        } else {
            rec.archive.open_write(&fname).await?
        };
        let id = self.register(FileSlot {
            for_reading: false,
            mount: Arc::clone(rec),
            file: Arc::new(Mutex::new(OpenFile::new(stream, false))),
        });
        trace!(path, id, appending, "opened for writing");
        Ok(Handle(id))
    }

    fn register(&self, slot: FileSlot) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.files.insert(id, slot);
        id
    }

    fn file_of(&self, handle: Handle) -> Result<Arc<Mutex<OpenFile>>> {
        self.files
            .get(&handle.0)
            .map(|slot| Arc::clone(&slot.file))
            .ok_or(ErrorCode::InvalidArgument)
    }

    /// Close a handle. Writers are flushed first; a flush failure aborts
    /// the close and leaves the handle open so the caller may retry.
    pub async fn close(&self, handle: Handle) -> Result<()> {
        let result = self.close_scan(handle).await;
        self.note(result)
    }

    async fn close_scan(&self, handle: Handle) -> Result<()> {
        let file = self.file_of(handle)?;
        {
            let mut file = file.lock().await;
            if !file.for_reading {
                file.flush().await?;
                file.stream.flush().await?;
            }
            if let Some(buf) = file.take_buffer() {
                self.allocator().release(buf);
            }
        }
        self.files.remove(&handle.0).ok_or(ErrorCode::InvalidArgument)?;
        trace!(id = handle.0, "closed");
        Ok(())
    }

    /// Read up to `out.len()` bytes. Returns the number read; `0` means end
    /// of file.
    pub async fn read_bytes(&self, handle: Handle, out: &mut [u8]) -> Result<usize> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.read_bytes(out).await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Write `data`. Returns the number of bytes accepted.
    pub async fn write_bytes(&self, handle: Handle, data: &[u8]) -> Result<usize> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.write_bytes(data).await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Object-count read: fills `out` with up to `count` records of `size`
    /// bytes and returns the number of complete records. A trailing partial
    /// record is not reported at this level.
    pub async fn read(&self, handle: Handle, out: &mut [u8], size: u32, count: u32) -> Result<u64> {
        let want = size as u64 * count as u64;
        if want > out.len() as u64 {
            return self.note(Err(ErrorCode::InvalidArgument));
        }
        if want == 0 {
            return Ok(0);
        }
        let got = self.read_bytes(handle, &mut out[..want as usize]).await?;
        Ok(got as u64 / size as u64)
    }

    /// Object-count write, mirroring [`Vfs::read`].
    pub async fn write(&self, handle: Handle, data: &[u8], size: u32, count: u32) -> Result<u64> {
        let want = size as u64 * count as u64;
        if want > data.len() as u64 {
            return self.note(Err(ErrorCode::InvalidArgument));
        }
        if want == 0 {
            return Ok(0);
        }
        let put = self.write_bytes(handle, &data[..want as usize]).await?;
        Ok(put as u64 / size as u64)
    }

    /// Move to an absolute position within the file.
    pub async fn seek(&self, handle: Handle, pos: u64) -> Result<()> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.seek(pos).await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Current logical position, buffering accounted for.
    pub async fn tell(&self, handle: Handle) -> Result<u64> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.tell().await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Whether a reading handle has consumed the whole file. Writing
    /// handles always report `true`.
    pub async fn eof(&self, handle: Handle) -> Result<bool> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.eof().await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Total length of the file behind the handle.
    pub async fn file_length(&self, handle: Handle) -> Result<u64> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.length().await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Attach a buffer of `size` bytes to the handle (`0` removes it).
    /// Pending writes are flushed and a reading handle is realigned first.
    pub async fn set_buffer(&self, handle: Handle, size: usize) -> Result<()> {
        let allocator = self.allocator();
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.set_buffer(size, allocator.as_ref()).await,
            Err(err) => Err(err),
        };
        self.note(result)
    }

    /// Push buffered writes through to the underlying stream.
    pub async fn flush(&self, handle: Handle) -> Result<()> {
        let result = match self.file_of(handle) {
            Ok(file) => file.lock().await.flush().await,
            Err(err) => Err(err),
        };
        self.note(result)
    }
}
