use super::common::{
    app_files, cache_path, config_for, read_cache, settings_for, write_large_image,
    write_small_file,
};
use pixel_mage::config::{CacheSetting, Config};
use pixel_mage::progress::ProgressCallback;
use pixel_mage::sweep::Sweeper;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Captures the persisted cache when the scan loop ends.
struct SnapshotAtScanEnd {
    cache: PathBuf,
    snapshot: Mutex<Option<serde_json::Value>>,
}

impl ProgressCallback for SnapshotAtScanEnd {
    fn on_entry(&self, _current: usize, _name: &str) {}

    fn on_scan_end(&self) {
        let value = fs::read_to_string(&self.cache)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok());
        *self.snapshot.lock().unwrap() = value;
    }
}

fn abc_config(dir: &std::path::Path) -> Config {
    let a_hash = write_small_file(dir, "a.jpg", &[0xAB; 400]);
    write_large_image(dir, "b.jpg", 800, 600);
    write_large_image(dir, "c.jpg", 3840, 2160);

    let mut settings = settings_for(dir);
    settings.images_to_remove = vec![a_hash];
    settings.checkpoint_interval_secs = 0;
    Config::from_settings(settings).unwrap()
}

#[test]
fn test_abc_scenario_first_run() {
    let dir = tempdir().unwrap();
    let config = abc_config(dir.path());

    let snapshot = Arc::new(SnapshotAtScanEnd {
        cache: cache_path(dir.path()),
        snapshot: Mutex::new(None),
    });
    let mut sweeper = Sweeper::from_config(&config).with_progress(snapshot.clone());
    let report = sweeper.run().unwrap();

    // Every verdict was checkpointed before deletion.
    let during = snapshot.snapshot.lock().unwrap().clone().unwrap();
    assert_eq!(during["files"]["a.jpg"], "not_found.jpg");
    assert_eq!(during["files"]["b.jpg"], "too_small: [800x600]");
    assert_eq!(during["files"]["c.jpg"], "");
    assert_eq!(during["meta"]["last_exit"], "interrupted");

    assert_eq!(report.counters.processed, 3);
    assert_eq!(report.counters.error_count, 0);
    assert_eq!(report.counters.skipped, 0);
    assert!(report.deletions.all_succeeded());
    assert!(!dir.path().join("a.jpg").exists());
    assert!(!dir.path().join("b.jpg").exists());
    assert!(dir.path().join("c.jpg").exists());

    // The final save drops delete verdicts.
    let after = read_cache(&cache_path(dir.path()));
    assert_eq!(after["meta"]["last_exit"], "clean");
    assert_eq!(after["meta"]["version"], 1);
    assert_eq!(after["files"], serde_json::json!({ "c.jpg": "" }));
}

#[test]
fn test_abc_scenario_second_run_uses_cache() {
    let dir = tempdir().unwrap();
    let config = abc_config(dir.path());

    Sweeper::from_config(&config).run().unwrap();
    let second = Sweeper::from_config(&config).run().unwrap();

    assert_eq!(second.counters.processed, 0);
    assert_eq!(second.counters.skipped, 1);
    assert_eq!(second.counters.error_count, 0);
    assert!(second.files.is_empty());
    assert!(dir.path().join("c.jpg").exists());
}

#[test]
fn test_cached_delete_verdict_is_applied_without_reading() {
    let dir = tempdir().unwrap();
    // Keep-sized content, but the cache says otherwise.
    write_large_image(dir.path(), "wide.png", 3840, 2160);
    fs::create_dir_all(dir.path().join(".pixel_mage")).unwrap();
    fs::write(
        cache_path(dir.path()),
        r#"{"meta":{"last_run":"2024-01-01T00:00:00.000Z","last_exit":"interrupted","version":1},"files":{"wide.png":"too_small: [10x10]"}}"#,
    )
    .unwrap();

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();

    assert_eq!(report.counters.skipped, 1);
    assert_eq!(report.counters.processed, 0);
    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].from_cache);
    assert_eq!(report.files[0].display_reason(), "too_small: [10x10] [cache]");
    assert!(!dir.path().join("wide.png").exists());
}

#[test]
fn test_subdirectories_removed_app_folder_kept() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested").join("deeper")).unwrap();
    fs::write(dir.path().join("nested").join("deeper").join("x.jpg"), b"x").unwrap();
    fs::create_dir_all(dir.path().join(".pixel_mage")).unwrap();

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();

    assert_eq!(report.directories.len(), 1);
    assert_eq!(report.directories[0].name, "nested");
    assert!(!dir.path().join("nested").exists());
    assert!(dir.path().join(".pixel_mage").exists());
    // Nested files are never visited.
    assert_eq!(report.counters.processed, 0);
}

#[test]
fn test_custom_app_folder_is_used() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("meta")).unwrap();
    write_small_file(dir.path(), "a.jpg", b"tiny");

    let mut settings = settings_for(dir.path());
    settings.app_folder = "meta".to_string();
    let config = Config::from_settings(settings).unwrap();
    Sweeper::from_config(&config).run().unwrap();

    assert!(dir.path().join("meta").join(".cache.json").exists());
    assert!(!dir.path().join(".pixel_mage").exists());
}

#[test]
fn test_disabled_cache_writes_nothing() {
    let dir = tempdir().unwrap();
    write_small_file(dir.path(), "a.jpg", b"tiny");

    let mut settings = settings_for(dir.path());
    settings.cache = CacheSetting::Enabled(false);
    settings.log = false;
    settings.errors = false;
    let config = Config::from_settings(settings).unwrap();

    let first = Sweeper::from_config(&config).run().unwrap();
    let second = Sweeper::from_config(&config).run().unwrap();

    assert_eq!(first.counters.processed, 1);
    assert_eq!(second.counters.processed, 1);
    assert!(!dir.path().join(".pixel_mage").exists());
}

#[test]
fn test_explicit_cache_path_outside_target() {
    let dir = tempdir().unwrap();
    let elsewhere = tempdir().unwrap();
    let cache_file = elsewhere.path().join("verdicts.json");
    write_small_file(dir.path(), "a.jpg", b"tiny");

    let mut settings = settings_for(dir.path());
    settings.cache = CacheSetting::Path(cache_file.clone());
    let config = Config::from_settings(settings).unwrap();
    Sweeper::from_config(&config).run().unwrap();

    let cache = read_cache(&cache_file);
    assert_eq!(cache["files"]["a.jpg"], "");
}

#[test]
fn test_empty_folder() {
    let dir = tempdir().unwrap();
    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();
    assert_eq!(report.total_entries, 0);
    assert_eq!(report.counters.processed, 0);
    assert!(report.deletions.successes.is_empty());
}

#[test]
fn test_run_log_written_to_app_folder() {
    let dir = tempdir().unwrap();
    write_large_image(dir.path(), "small.png", 640, 480);

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();
    assert_eq!(report.files.len(), 1);

    let logs = app_files(dir.path(), "log-");
    assert_eq!(logs.len(), 1);
    let content = fs::read_to_string(&logs[0]).unwrap();
    assert!(content.contains("Found 1 files to handle"));
    assert!(content.contains("No previous cache found..."));
    assert!(content.contains("Processed 1 new files"));
    assert!(content.contains("[files] removing small.png because: too_small: [640x480]"));
    assert!(content.contains("finished on "));
}

#[test]
fn test_trash_mode_removes_from_folder() {
    let dir = tempdir().unwrap();
    write_large_image(dir.path(), "small.png", 640, 480);

    let mut settings = settings_for(dir.path());
    settings.trash = true;
    let config = Config::from_settings(settings).unwrap();
    let report = Sweeper::from_config(&config).run().unwrap();

    // Trash may be unavailable in CI sandboxes; a failure is reported, not fatal.
    if report.deletions.all_succeeded() {
        assert!(!dir.path().join("small.png").exists());
        assert!(!report.deletions.successes[0].permanent);
    } else {
        assert_eq!(report.deletions.failure_count(), 1);
    }
}

#[test]
fn test_checkpoint_interval_respected() {
    let dir = tempdir().unwrap();
    write_small_file(dir.path(), "a.jpg", b"a");
    write_small_file(dir.path(), "b.jpg", b"b");

    // With the default interval nothing is saved before the final save.
    let snapshot = Arc::new(SnapshotAtScanEnd {
        cache: cache_path(dir.path()),
        snapshot: Mutex::new(None),
    });
    let mut settings = settings_for(dir.path());
    settings.checkpoint_interval_secs = 3600;
    let config = Config::from_settings(settings).unwrap();
    Sweeper::from_config(&config)
        .with_progress(snapshot.clone())
        .run()
        .unwrap();

    assert!(snapshot.snapshot.lock().unwrap().is_none());
    assert!(cache_path(dir.path()).exists());
}

#[test]
fn test_md5_decimal_hash_list_matches() {
    use pixel_mage::classifier::{ContentDigest, DigestAlgorithm};

    let dir = tempdir().unwrap();
    let content = [137u8, 80, 78, 71];
    fs::write(dir.path().join("placeholder.jpg"), content).unwrap();
    write_small_file(dir.path(), "other.jpg", b"kept");

    let mut settings = settings_for(dir.path());
    settings.digest = DigestAlgorithm::Md5Decimal;
    settings.images_to_remove = vec![DigestAlgorithm::Md5.digest(b"137,80,78,71")];
    let report = Sweeper::from_config(&Config::from_settings(settings).unwrap())
        .run()
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert!(!dir.path().join("placeholder.jpg").exists());
    assert!(dir.path().join("other.jpg").exists());
}
