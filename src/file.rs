//! Open-file records and their buffering layer.
//!
//! Callers hold a [`Handle`] token; the instance maps it to an [`OpenFile`]
//! guarded by its own lock, so operations on different handles never
//! contend. The optional buffer sits between the caller and the stream:
//! reads refill it in `bufsize` chunks, writes collect in it until full, and
//! seeks inside the buffered window only move `bufpos`.

use crate::allocator::Allocator;
use crate::error::{ErrorCode, Result};
use crate::io::IoStream;

/// Opaque token naming an open file within one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) u64);

pub(crate) struct OpenFile {
    pub(crate) stream: Box<dyn IoStream>,
    pub(crate) for_reading: bool,
    buffer: Vec<u8>,
    bufsize: usize,
    buffill: usize,
    bufpos: usize,
}

impl OpenFile {
    pub(crate) fn new(stream: Box<dyn IoStream>, for_reading: bool) -> Self {
        Self { stream, for_reading, buffer: Vec::new(), bufsize: 0, buffill: 0, bufpos: 0 }
    }

    pub(crate) async fn read_bytes(&mut self, out: &mut [u8]) -> Result<usize> {
        if !self.for_reading {
            return Err(ErrorCode::OpenForWriting);
        }
        if self.bufsize == 0 {
            return self.stream.read(out).await;
        }

        let mut total = 0;
        while total < out.len() {
            let avail = self.buffill - self.bufpos;
            if avail > 0 {
                let take = avail.min(out.len() - total);
                out[total..total + take]
                    .copy_from_slice(&self.buffer[self.bufpos..self.bufpos + take]);
                self.bufpos += take;
                total += take;
                continue;
            }
            match self.stream.read(&mut self.buffer[..self.bufsize]).await {
                Ok(0) => break,
                Ok(got) => {
                    self.buffill = got;
                    self.bufpos = 0;
                }
                Err(err) => {
                    if total == 0 {
                        return Err(err);
                    }
                    break;
                }
            }
        }
        Ok(total)
    }

    pub(crate) async fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        if self.for_reading {
            return Err(ErrorCode::OpenForReading);
        }
        if self.bufsize == 0 {
            return self.stream.write(data).await;
        }
        if self.buffill + data.len() <= self.bufsize {
            self.buffer[self.buffill..self.buffill + data.len()].copy_from_slice(data);
            self.buffill += data.len();
            return Ok(data.len());
        }
        // Too big for the remaining buffer: drain it, then pass the payload
        // through without re-buffering.
        self.flush().await?;
        self.stream.write(data).await
    }

    /// Push pending buffered writes out. Failure leaves the buffer intact so
    /// the caller may retry.
    pub(crate) async fn flush(&mut self) -> Result<()> {
        if self.for_reading || self.bufpos == self.buffill {
            return Ok(());
        }
        let pending = self.buffill - self.bufpos;
        let put = self.stream.write(&self.buffer[self.bufpos..self.buffill]).await?;
        if put < pending {
            self.bufpos += put;
            return Err(ErrorCode::Io);
        }
        self.bufpos = 0;
        self.buffill = 0;
        self.stream.flush().await
    }

    pub(crate) async fn seek(&mut self, pos: u64) -> Result<()> {
        self.flush().await?;
        if self.for_reading && self.buffill > 0 {
            // Seeking within the buffered window only moves the cursor.
            let offset = pos as i64 - self.tell().await? as i64;
            let within = if offset >= 0 {
                offset as usize <= self.buffill - self.bufpos
            } else {
                (-offset) as usize <= self.bufpos
            };
            if within {
                self.bufpos = (self.bufpos as i64 + offset) as usize;
                return Ok(());
            }
        }
        self.bufpos = 0;
        self.buffill = 0;
        self.stream.seek(pos).await
    }

    pub(crate) async fn tell(&mut self) -> Result<u64> {
        let raw = self.stream.tell().await? as i64;
        let logical = if self.for_reading {
            raw - self.buffill as i64 + self.bufpos as i64
        } else {
            raw + self.buffill as i64
        };
        Ok(logical as u64)
    }

    pub(crate) async fn length(&mut self) -> Result<u64> {
        self.stream.length().await
    }

    pub(crate) async fn eof(&mut self) -> Result<bool> {
        if !self.for_reading {
            return Ok(true);
        }
        Ok(self.tell().await? >= self.length().await?)
    }

    pub(crate) async fn set_buffer(&mut self, size: usize, alloc: &dyn Allocator) -> Result<()> {
        self.flush().await?;
        if self.for_reading && self.buffill > self.bufpos {
            // Realign the stream to the logical position before dropping the
            // unread tail of the buffer.
            let logical = self.tell().await?;
            self.stream.seek(logical).await?;
        }
        if self.bufsize > 0 {
            alloc.release(std::mem::take(&mut self.buffer));
        }
        if size > 0 {
            self.buffer = alloc.acquire(size);
        }
        self.bufsize = size;
        self.bufpos = 0;
        self.buffill = 0;
        Ok(())
    }

    /// Detach the buffer for return to the allocator at close.
    pub(crate) fn take_buffer(&mut self) -> Option<Vec<u8>> {
        if self.bufsize == 0 {
            return None;
        }
        self.bufsize = 0;
        self.bufpos = 0;
        self.buffill = 0;
        Some(std::mem::take(&mut self.buffer))
    }
}
