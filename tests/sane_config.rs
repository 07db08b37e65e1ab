//! `set_sane_config` touches the per-user tree, so this suite pins
//! XDG_DATA_HOME to a scratch directory and runs alone in its process.
#![cfg(unix)]

mod common;

use common::pak_bytes;
use packvfs::Vfs;
use tempfile::TempDir;

/// Serializes the tests in this binary around the env mutation.
static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[tokio::test]
async fn sane_config_wires_up_dirs_and_archives() {
    let _env = ENV_LOCK.lock().unwrap();
    let data_home = TempDir::new().expect("create data home");
    std::env::set_var("XDG_DATA_HOME", data_home.path());

    // Pre-seed the per-user tree with an archive the setup should pick up.
    let app_dir = data_home.path().join("acme").join("quarry");
    std::fs::create_dir_all(&app_dir).expect("create app dir");
    std::fs::write(app_dir.join("extra.pak"), pak_bytes(&[("bonus.txt", b"found me")]))
        .expect("write seeded archive");

    let vfs = Vfs::new(None).expect("create instance");
    vfs.set_sane_config("acme", "quarry", Some("pak"), false, false).await.unwrap();

    let write_dir = vfs.write_dir().await.expect("write dir set");
    assert!(write_dir.contains("acme"));
    assert!(write_dir.contains("quarry"));

    let search = vfs.search_path().await;
    assert!(search.len() >= 3, "pref dir, base dir and the archive: {search:?}");
    assert!(search.iter().any(|s| s.ends_with("extra.pak")));

    // The seeded archive's content resolves through the search path, and
    // the write dir accepts new files.
    assert_eq!(common::slurp(&vfs, "/bonus.txt").await, b"found me");
    let handle = vfs.open_write("/save.dat").await.unwrap();
    vfs.write_bytes(handle, b"progress").await.unwrap();
    vfs.close(handle).await.unwrap();
    assert!(app_dir.join("save.dat").exists());
}

#[tokio::test]
async fn sane_config_tolerates_a_missing_extension_filter() {
    let _env = ENV_LOCK.lock().unwrap();
    let data_home = TempDir::new().expect("create data home");
    std::env::set_var("XDG_DATA_HOME", data_home.path());

    let vfs = Vfs::new(None).expect("create instance");
    vfs.set_sane_config("acme", "pebble", None, true, true).await.unwrap();

    assert!(vfs.write_dir().await.is_some());
    assert!(!vfs.search_path().await.is_empty());
}
