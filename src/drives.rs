//! Process-level registry of instances ("drives"), addressed by a small
//! fixed index. Embedders that want a single private instance can construct
//! [`Vfs`] directly instead.

use std::sync::{Arc, OnceLock, RwLock};

use crate::error::{ErrorCode, Result};
use crate::vfs::Vfs;

/// Number of drive slots.
pub const NUM_DRIVES: usize = 8;

type Slot = RwLock<Option<Arc<Vfs>>>;

static DRIVES: OnceLock<Vec<Slot>> = OnceLock::new();

fn table() -> &'static Vec<Slot> {
    DRIVES.get_or_init(|| (0..NUM_DRIVES).map(|_| RwLock::new(None)).collect())
}

fn slot(drive: usize) -> Result<&'static Slot> {
    table().get(drive).ok_or(ErrorCode::InvalidArgument)
}

/// Bring a drive up. Fails with [`ErrorCode::IsInitialized`] if it already
/// is.
pub fn init(drive: usize, argv0: Option<&str>) -> Result<()> {
    let mut guard = slot(drive)?.write().expect("drive table poisoned");
    if guard.is_some() {
        return Err(ErrorCode::IsInitialized);
    }
    *guard = Some(Arc::new(Vfs::new(argv0)?));
    Ok(())
}

pub fn is_init(drive: usize) -> bool {
    slot(drive)
        .map(|s| s.read().expect("drive table poisoned").is_some())
        .unwrap_or(false)
}

/// The instance behind a drive index.
pub fn drive(drive: usize) -> Result<Arc<Vfs>> {
    slot(drive)?
        .read()
        .expect("drive table poisoned")
        .as_ref()
        .map(Arc::clone)
        .ok_or(ErrorCode::NotInitialized)
}

/// Tear a drive down: writers flushed best-effort, every mount released.
pub async fn deinit(drive: usize) -> Result<()> {
    let vfs = slot(drive)?
        .write()
        .expect("drive table poisoned")
        .take()
        .ok_or(ErrorCode::NotInitialized)?;
    vfs.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drive_lifecycle() {
        // Use the last slot to stay clear of other tests.
        let dv = NUM_DRIVES - 1;
        assert!(!is_init(dv));
        assert_eq!(drive(dv).err(), Some(ErrorCode::NotInitialized));

        init(dv, None).unwrap();
        assert!(is_init(dv));
        assert_eq!(init(dv, None).err(), Some(ErrorCode::IsInitialized));
        assert!(drive(dv).is_ok());

        deinit(dv).await.unwrap();
        assert!(!is_init(dv));
        assert_eq!(deinit(dv).await.err(), Some(ErrorCode::NotInitialized));
    }

    #[test]
    fn out_of_range_drives_are_rejected() {
        assert_eq!(init(NUM_DRIVES, None).err(), Some(ErrorCode::InvalidArgument));
        assert!(!is_init(NUM_DRIVES));
    }
}
