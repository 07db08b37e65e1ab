mod common;

use common::{slurp, Fixture};
use packvfs::{EnumerateAction, ErrorCode, FileKind};

#[tokio::test]
async fn root_is_writable_only_with_a_write_dir() {
    let fixture = Fixture::new();

    let stat = fixture.vfs.stat("/").await.unwrap();
    assert_eq!(stat.kind, FileKind::Directory);
    assert!(stat.readonly);

    fixture.use_as_write_dir().await;
    let stat = fixture.vfs.stat("/").await.unwrap();
    assert!(!stat.readonly);
}

#[tokio::test]
async fn mkdir_creates_missing_parents() {
    let fixture = Fixture::new();
    fixture.use_as_write_dir().await;
    fixture.mount_root().await;

    fixture.vfs.mkdir("/saves/slot1/screens").await.unwrap();
    assert!(fixture.vfs.is_directory("/saves").await);
    assert!(fixture.vfs.is_directory("/saves/slot1/screens").await);

    // Creating the same tree again is fine.
    fixture.vfs.mkdir("/saves/slot1/screens").await.unwrap();

    // A file in ancestor position surfaces as a duplicate entry.
    fixture.write_file("saves/slot1/notes", b"x");
    assert_eq!(
        fixture.vfs.mkdir("/saves/slot1/notes/deeper").await.err(),
        Some(ErrorCode::Duplicate)
    );
}

#[tokio::test]
async fn delete_removes_files_and_empty_directories() {
    let fixture = Fixture::new();
    fixture.use_as_write_dir().await;
    fixture.mount_root().await;
    fixture.write_file("dir/inner.txt", b"x");

    assert_eq!(fixture.vfs.delete("/dir").await.err(), Some(ErrorCode::DirNotEmpty));
    fixture.vfs.delete("/dir/inner.txt").await.unwrap();
    fixture.vfs.delete("/dir").await.unwrap();
    assert!(!fixture.vfs.exists("/dir").await);
    assert_eq!(fixture.vfs.delete("/dir").await.err(), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn write_operations_require_a_write_dir() {
    let fixture = Fixture::new();
    fixture.mount_root().await;
    fixture.write_file("present.txt", b"x");

    assert_eq!(fixture.vfs.open_write("/new.txt").await.err(), Some(ErrorCode::NoWriteDir));
    assert_eq!(fixture.vfs.open_append("/new.txt").await.err(), Some(ErrorCode::NoWriteDir));
    assert_eq!(fixture.vfs.mkdir("/d").await.err(), Some(ErrorCode::NoWriteDir));
    assert_eq!(fixture.vfs.delete("/present.txt").await.err(), Some(ErrorCode::NoWriteDir));
}

#[tokio::test]
async fn enumeration_dedups_and_sorts_across_mounts() {
    let fixture = Fixture::new();
    fixture.write_file("a/zeta.txt", b"1");
    fixture.write_file("a/alpha.txt", b"1");
    fixture.write_file("b/alpha.txt", b"2");
    fixture.write_file("b/midway.txt", b"2");

    fixture.vfs.mount(&fixture.path_str("a"), None, true).await.unwrap();
    fixture.vfs.mount(&fixture.path_str("b"), None, true).await.unwrap();

    assert_eq!(
        fixture.vfs.enumerate_files("/").await.unwrap(),
        ["alpha.txt", "midway.txt", "zeta.txt"]
    );
    // The shadowed duplicate still resolves through the earlier mount.
    assert_eq!(slurp(&fixture.vfs, "/alpha.txt").await, b"1");
}

#[tokio::test]
async fn callbacks_can_stop_or_abort_enumeration() {
    let fixture = Fixture::new();
    fixture.write_file("a/one", b"");
    fixture.write_file("a/two", b"");
    fixture.write_file("a/three", b"");
    fixture.vfs.mount(&fixture.path_str("a"), None, true).await.unwrap();

    let mut seen = 0;
    fixture
        .vfs
        .enumerate("/", |_, _| {
            seen += 1;
            EnumerateAction::Stop
        })
        .await
        .unwrap();
    assert_eq!(seen, 1);

    assert_eq!(
        fixture.vfs.enumerate("/", |_, _| EnumerateAction::Error).await.err(),
        Some(ErrorCode::AppCallback)
    );
    assert_eq!(fixture.vfs.last_error_code(), ErrorCode::AppCallback);
}

#[tokio::test]
async fn enumerating_nothing_is_empty_success() {
    let fixture = Fixture::new();
    fixture.create_dir("a");
    fixture.vfs.mount(&fixture.path_str("a"), None, true).await.unwrap();

    assert!(fixture.vfs.enumerate_files("/").await.unwrap().is_empty());
    assert!(fixture.vfs.enumerate_files("/absent").await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_virtual_paths_are_rejected_early() {
    let fixture = Fixture::new();
    fixture.mount_root().await;

    assert_eq!(fixture.vfs.open_read("/a/../b").await.err(), Some(ErrorCode::BadFilename));
    assert_eq!(fixture.vfs.stat("a:b").await.err(), Some(ErrorCode::BadFilename));
    assert_eq!(fixture.vfs.mkdir("back\\slash").await.err(), Some(ErrorCode::BadFilename));
    assert_eq!(fixture.vfs.last_error_code(), ErrorCode::BadFilename);
    // Reading the slot cleared it.
    assert_eq!(fixture.vfs.last_error_code(), ErrorCode::Ok);
}

#[tokio::test]
async fn stat_reports_regular_file_details() {
    let fixture = Fixture::new();
    fixture.mount_root().await;
    fixture.write_file("data.bin", b"12345");

    let stat = fixture.vfs.stat("/data.bin").await.unwrap();
    assert_eq!(stat.kind, FileKind::Regular);
    assert_eq!(stat.size, 5);
    assert!(stat.mtime > 0);
    assert!(!fixture.vfs.is_directory("/data.bin").await);
    assert!(!fixture.vfs.is_symbolic_link("/data.bin").await);
}
