mod common;

use common::{pak_bytes, slurp, Fixture};
use packvfs::Profile;

#[tokio::test]
async fn a_profile_brings_up_a_whole_instance() {
    let fixture = Fixture::new();
    fixture.create_dir("save");
    fixture.create_dir("base");
    fixture.write_file("base/default.cfg", b"volume=7");
    fixture.write_file("tex.pak", &pak_bytes(&[("wall.tga", b"pixels")]));

    let text = format!(
        r#"
        write_dir = "{save}"

        [[mount]]
        source = "{save}"

        [[mount]]
        source = "{base}"

        [[mount]]
        source = "{pak}"
        mount_point = "gfx"
        "#,
        save = fixture.path_str("save"),
        base = fixture.path_str("base"),
        pak = fixture.path_str("tex.pak"),
    );
    let profile = Profile::from_toml(&text).unwrap();
    fixture.vfs.apply_profile(&profile).await.unwrap();

    assert_eq!(fixture.vfs.write_dir().await, Some(fixture.path_str("save")));
    assert_eq!(
        fixture.vfs.search_path().await,
        vec![fixture.path_str("save"), fixture.path_str("base"), fixture.path_str("tex.pak")]
    );

    // Saves shadow base content, archives resolve at their mount point.
    assert_eq!(slurp(&fixture.vfs, "/default.cfg").await, b"volume=7");
    assert_eq!(slurp(&fixture.vfs, "/gfx/wall.tga").await, b"pixels");

    let handle = fixture.vfs.open_write("/default.cfg").await.unwrap();
    fixture.vfs.write_bytes(handle, b"volume=9").await.unwrap();
    fixture.vfs.close(handle).await.unwrap();
    assert_eq!(slurp(&fixture.vfs, "/default.cfg").await, b"volume=9");
}

#[tokio::test]
async fn profiles_load_from_disk() {
    let fixture = Fixture::new();
    fixture.create_dir("data");
    let text = format!(
        "[[mount]]\nsource = \"{}\"\n",
        fixture.path_str("data")
    );
    fixture.write_file("mounts.toml", text.as_bytes());

    let profile = Profile::load(&fixture.path("mounts.toml")).await.unwrap();
    fixture.vfs.apply_profile(&profile).await.unwrap();
    assert_eq!(fixture.vfs.search_path().await, vec![fixture.path_str("data")]);
}

#[tokio::test]
async fn broken_profiles_fail_to_apply() {
    let fixture = Fixture::new();
    let profile = Profile::from_toml(
        r#"
        [[mount]]
        source = "/definitely/not/there"
        "#,
    )
    .unwrap();

    assert!(fixture.vfs.apply_profile(&profile).await.is_err());
    assert!(fixture.vfs.search_path().await.is_empty());
}
