mod common;

use common::{pak_bytes, slurp, Fixture};
use packvfs::{ErrorCode, FileKind};

#[tokio::test]
async fn pak_files_mount_from_disk() {
    let fixture = Fixture::new();
    fixture.write_file(
        "pack.pak",
        &pak_bytes(&[("data/x", b"inside the pak"), ("readme.txt", b"top level")]),
    );

    fixture.vfs.mount(&fixture.path_str("pack.pak"), None, true).await.unwrap();

    assert_eq!(fixture.vfs.enumerate_files("/").await.unwrap(), ["data", "readme.txt"]);
    assert_eq!(fixture.vfs.enumerate_files("/data").await.unwrap(), ["x"]);
    assert_eq!(slurp(&fixture.vfs, "/data/x").await, b"inside the pak");

    let stat = fixture.vfs.stat("/data/x").await.unwrap();
    assert_eq!(stat.kind, FileKind::Regular);
    assert_eq!(stat.size, 14);
    assert!(stat.readonly);
}

#[tokio::test]
async fn directories_shadow_and_dedup_against_archives() {
    let fixture = Fixture::new();
    fixture.create_dir("a");
    fixture.write_file("pack.pak", &pak_bytes(&[("data/x", b"from pak")]));

    fixture.vfs.mount(&fixture.path_str("a"), None, true).await.unwrap();
    fixture.vfs.mount(&fixture.path_str("pack.pak"), None, true).await.unwrap();

    assert_eq!(fixture.vfs.enumerate_files("/data").await.unwrap(), ["x"]);
    assert_eq!(fixture.vfs.real_dir("/data/x").await.unwrap(), fixture.path_str("pack.pak"));

    // Write the same path into the directory mount; it shadows the archive
    // and the listing still names the entry once.
    fixture.vfs.set_write_dir(Some(&fixture.path_str("a"))).await.unwrap();
    fixture.vfs.mkdir("/data").await.unwrap();
    let handle = fixture.vfs.open_write("/data/x").await.unwrap();
    fixture.vfs.write_bytes(handle, b"from dir").await.unwrap();
    fixture.vfs.close(handle).await.unwrap();

    assert_eq!(fixture.vfs.enumerate_files("/data").await.unwrap(), ["x"]);
    assert_eq!(slurp(&fixture.vfs, "/data/x").await, b"from dir");
    assert_eq!(fixture.vfs.real_dir("/data/x").await.unwrap(), fixture.path_str("a"));
}

#[tokio::test]
async fn archives_mounted_at_points_synthesize_parents() {
    let fixture = Fixture::new();
    fixture.write_file("tex.pak", &pak_bytes(&[("wall.tga", b"pixels")]));

    fixture.vfs.mount(&fixture.path_str("tex.pak"), Some("assets"), true).await.unwrap();

    let stat = fixture.vfs.stat("/assets").await.unwrap();
    assert_eq!(stat.kind, FileKind::Directory);
    assert!(stat.readonly);

    // No mount sits at the root, yet the mount point appears there.
    assert_eq!(fixture.vfs.enumerate_files("/").await.unwrap(), ["assets"]);
    assert_eq!(slurp(&fixture.vfs, "/assets/wall.tga").await, b"pixels");
}

#[tokio::test]
async fn archive_write_attempts_report_read_only() {
    let fixture = Fixture::new();
    fixture.write_file("pack.pak", &pak_bytes(&[("a.txt", b"x")]));
    fixture.vfs.mount(&fixture.path_str("pack.pak"), None, true).await.unwrap();

    // Reads resolve, but the archive can never be the write target, so the
    // write side stays gated on the write dir.
    assert!(fixture.vfs.exists("/a.txt").await);
    assert_eq!(fixture.vfs.open_write("/a.txt").await.err(), Some(ErrorCode::NoWriteDir));
}

#[tokio::test]
async fn corrupt_archives_fail_to_mount() {
    let fixture = Fixture::new();
    let mut broken = pak_bytes(&[("a.txt", b"x")]);
    broken[8] = 13; // directory length no longer a multiple of the entry size
    fixture.write_file("broken.pak", &broken);

    assert_eq!(
        fixture.vfs.mount(&fixture.path_str("broken.pak"), None, true).await.err(),
        Some(ErrorCode::Corrupt)
    );
    assert!(fixture.vfs.search_path().await.is_empty());
}

#[tokio::test]
async fn archives_can_be_mounted_through_open_handles() {
    let fixture = Fixture::new();
    fixture.write_file("outer/inner.pak", &pak_bytes(&[("hello.txt", b"nested hi")]));
    fixture.vfs.mount(&fixture.path_str("outer"), None, true).await.unwrap();

    let handle = fixture.vfs.open_read("/inner.pak").await.unwrap();
    fixture.vfs.mount_handle(handle, "inner.pak", Some("pk"), true).await.unwrap();

    assert_eq!(slurp(&fixture.vfs, "/pk/hello.txt").await, b"nested hi");
    assert_eq!(fixture.vfs.enumerate_files("/pk").await.unwrap(), ["hello.txt"]);

    // The backing handle must outlive the mount.
    fixture.vfs.unmount("inner.pak").await.unwrap();
    fixture.vfs.close(handle).await.unwrap();
}

#[tokio::test]
async fn registry_reports_the_builtin_format() {
    assert!(packvfs::archiver_count() >= 1);
    let types = packvfs::supported_archive_types();
    assert!(types.iter().any(|(ext, _)| *ext == "pak"));
}
