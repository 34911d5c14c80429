use super::common::{app_files, config_for, settings_for, write_large_image, write_small_file};
use pixel_mage::config::Config;
use pixel_mage::sweep::Sweeper;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_undecodable_large_file_is_counted_and_logged() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.jpg"), vec![0x42u8; 50_000]).unwrap();
    write_large_image(dir.path(), "small.png", 320, 200);
    write_small_file(dir.path(), "ok.jpg", b"fine");

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();

    assert_eq!(report.counters.error_count, 1);
    assert_eq!(report.counters.processed, 2);
    // The failed file is neither deleted nor cached.
    assert!(dir.path().join("broken.jpg").exists());
    assert!(!dir.path().join("small.png").exists());

    let error_log = report.error_log.expect("error log written");
    let content = fs::read_to_string(&error_log).unwrap();
    assert!(content.starts_with("broken.jpg on "));
    assert!(content.contains("    Classify\n"));
    assert!(content.contains("caused by:"));
    assert_eq!(app_files(dir.path(), "errors-"), vec![error_log]);
}

#[test]
fn test_failed_file_is_retried_next_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.jpg"), vec![0x42u8; 50_000]).unwrap();

    let config = config_for(dir.path());
    let first = Sweeper::from_config(&config).run().unwrap();
    let second = Sweeper::from_config(&config).run().unwrap();

    assert_eq!(first.counters.error_count, 1);
    assert_eq!(second.counters.error_count, 1);
    assert_eq!(second.counters.skipped, 0);
}

#[test]
fn test_errors_disabled_writes_no_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.jpg"), vec![0x42u8; 50_000]).unwrap();

    let mut settings = settings_for(dir.path());
    settings.file_errors = false;
    let config = Config::from_settings(settings).unwrap();
    let report = Sweeper::from_config(&config).run().unwrap();

    assert_eq!(report.counters.error_count, 1);
    assert!(report.error_log.is_none());
    assert!(app_files(dir.path(), "errors-").is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_stop_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.jpg");
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    write_small_file(dir.path(), "open.jpg", b"open");

    // Root reads anything.
    let readable = fs::read(&locked).is_ok();
    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if readable {
        assert_eq!(report.counters.processed, 2);
    } else {
        assert_eq!(report.counters.error_count, 1);
        assert_eq!(report.counters.processed, 1);
        let content = fs::read_to_string(report.error_log.unwrap()).unwrap();
        assert!(content.contains("    Read\n"));
    }
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_left_alone() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::create_dir(outside.path().join("real_dir")).unwrap();
    std::os::unix::fs::symlink(outside.path().join("real_dir"), dir.path().join("link")).unwrap();

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();

    assert!(report.directories.is_empty());
    assert_eq!(report.counters.processed, 0);
    assert!(dir.path().join("link").exists());
    assert!(outside.path().join("real_dir").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_is_left_alone() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let odd = dir.path().join(OsStr::from_bytes(b"odd\xff.jpg"));
    fs::write(&odd, b"x").unwrap();
    write_small_file(dir.path(), "ok.jpg", b"fine");

    let report = Sweeper::from_config(&config_for(dir.path())).run().unwrap();

    assert_eq!(report.counters.error_count, 1);
    assert_eq!(report.counters.processed, 1);
    assert!(odd.exists());
    let content = fs::read_to_string(report.error_log.unwrap()).unwrap();
    assert!(content.contains("    Walk\n"));
}

#[test]
fn test_error_summary_without_error_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.jpg"), vec![0x42u8; 50_000]).unwrap();

    let mut settings = settings_for(dir.path());
    settings.file_errors = false;
    let report = Sweeper::from_config(&Config::from_settings(settings).unwrap())
        .run()
        .unwrap();
    assert_eq!(report.counters.error_count, 1);

    let log = fs::read_to_string(&app_files(dir.path(), "log-")[0]).unwrap();
    assert!(log.contains("1 errors found\n"));
    assert!(!log.contains("see"));
}
