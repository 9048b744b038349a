use std::fs;
use std::path::Path;

use codexu::update::locator::BinaryMatcher;
use codexu::update::platform::{ArchKey, HostPlatform, OsKey};
use codexu::update::selector::{AssetSelector, ReleaseAsset};
use codexu::update::{installer, unpack_binary};
use tempfile::tempdir;

fn linux() -> HostPlatform {
    HostPlatform::new(Some(OsKey::Linux), Some(ArchKey::X86_64))
}

fn write_tar_zst(path: &Path, entries: &[(&str, &[u8])]) {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    let tar = builder.into_inner().unwrap();
    fs::write(path, zstd::encode_all(&tar[..], 0).unwrap()).unwrap();
}

#[test]
fn test_select_extract_locate_install() {
    let assets = vec![
        ReleaseAsset::new("codex-responses-linux-x86_64.tar.gz", "https://example.com/1"),
        ReleaseAsset::new("codex-linux-x86_64.tar.zst", "https://example.com/2"),
        ReleaseAsset::new("codex-linux-arm64.tar.zst", "https://example.com/3"),
    ];
    let host = linux();
    let selector = AssetSelector::default();
    let asset = selector
        .select(&assets, host.os, host.arch.as_ref())
        .unwrap();
    assert_eq!(asset.name, "codex-linux-x86_64.tar.zst");

    let install_dir = tempdir().unwrap();
    let live = install_dir.path().join("codex");
    fs::write(&live, b"old build").unwrap();

    let scratch = tempdir().unwrap();
    let archive = scratch.path().join(&asset.name);
    write_tar_zst(
        &archive,
        &[("dist/codex-sdk", b"sdk build"), ("dist/codex", b"new build")],
    );

    let matcher = BinaryMatcher::new("codex", selector);
    let binary = unpack_binary(&archive, scratch.path(), &matcher, &host, "codex").unwrap();
    assert!(binary.ends_with("dist/codex"));

    installer::install(&binary, &live).unwrap();
    assert_eq!(fs::read(&live).unwrap(), b"new build");
    assert_eq!(
        fs::read(install_dir.path().join("codex.bak")).unwrap(),
        b"old build"
    );
    assert!(!install_dir.path().join(".codex.new").exists());
}

#[test]
fn test_scratch_dir_removed_after_failure() {
    let scratch_path;
    {
        let scratch = tempdir().unwrap();
        scratch_path = scratch.path().to_path_buf();
        let archive = scratch.path().join("codex-linux-x86_64.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let matcher = BinaryMatcher::new("codex", AssetSelector::default());
        let result = unpack_binary(&archive, scratch.path(), &matcher, &linux(), "codex");
        assert!(result.is_err());
    }
    assert!(!scratch_path.exists());
}
