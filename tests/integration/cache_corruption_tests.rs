use super::common::{cache_path, config_for, read_cache, write_small_file};
use pixel_mage::cache::{CacheError, VerdictCache};
use pixel_mage::sweep::Sweeper;
use std::fs;
use tempfile::tempdir;

fn write_cache(dir: &std::path::Path, content: &str) {
    let path = cache_path(dir);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_invalid_json_behaves_like_no_cache() {
    let dir = tempdir().unwrap();
    write_cache(dir.path(), "{ this is not json");

    let cache = VerdictCache::load(cache_path(dir.path()));
    assert!(cache.is_empty());
    assert!(cache.is_new());
    assert!(matches!(
        VerdictCache::read_file(&cache_path(dir.path())),
        Err(CacheError::Parse { .. })
    ));
}

#[test]
fn test_wrong_version_behaves_like_no_cache() {
    let dir = tempdir().unwrap();
    write_cache(
        dir.path(),
        r#"{"meta":{"last_run":"2024-01-01T00:00:00.000Z","last_exit":"clean","version":2},"files":{"a.jpg":""}}"#,
    );

    let cache = VerdictCache::load(cache_path(dir.path()));
    assert!(cache.is_empty());
    assert!(matches!(
        VerdictCache::read_file(&cache_path(dir.path())),
        Err(CacheError::Version { found: 2, .. })
    ));
}

#[test]
fn test_corrupt_cache_run_reprocesses_and_repairs() {
    let dir = tempdir().unwrap();
    write_small_file(dir.path(), "a.jpg", b"aaa");
    write_small_file(dir.path(), "b.jpg", b"bbb");
    write_cache(dir.path(), "\u{0}\u{1}garbage");

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();
    assert_eq!(report.counters.processed, 2);
    assert_eq!(report.counters.skipped, 0);
    assert_eq!(report.counters.error_count, 0);

    let repaired = read_cache(&cache_path(dir.path()));
    assert_eq!(repaired["meta"]["version"], 1);
    assert_eq!(repaired["files"]["a.jpg"], "");
    assert_eq!(repaired["files"]["b.jpg"], "");
}

#[test]
fn test_wrong_shape_behaves_like_no_cache() {
    let dir = tempdir().unwrap();
    write_cache(dir.path(), r#"{"files":["a.jpg"]}"#);
    assert!(VerdictCache::load(cache_path(dir.path())).is_empty());
}

#[cfg(unix)]
#[test]
fn test_unwritable_cache_fails_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_small_file(dir.path(), "a.jpg", b"aaa");
    let app_dir = dir.path().join(".pixel_mage");
    fs::create_dir_all(&app_dir).unwrap();
    fs::set_permissions(&app_dir, fs::Permissions::from_mode(0o500)).unwrap();

    // Root ignores permission bits.
    if fs::write(app_dir.join("write_check"), b"x").is_ok() {
        fs::set_permissions(&app_dir, fs::Permissions::from_mode(0o700)).unwrap();
        return;
    }

    let result = Sweeper::from_config(&config_for(dir.path())).run();
    fs::set_permissions(&app_dir, fs::Permissions::from_mode(0o700)).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        pixel_mage::sweep::SweepError::Cache(CacheError::Write { .. })
    ));
}
