use pixel_mage::cache::{LastExit, VerdictCache, NEW_CACHE};
use pixel_mage::classifier::Verdict;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn filled(path: &std::path::Path) -> VerdictCache {
    let mut cache = VerdictCache::load(path);
    cache.set("keep.jpg", Verdict::Keep);
    cache.set("placeholder.jpg", Verdict::not_found());
    cache.set("tiny.jpg", Verdict::from("too_small: [800x600]"));
    cache
}

#[test]
fn test_save_without_prune_reproduces_map() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("meta").join(".cache.json");

    let mut cache = filled(&path);
    let expected: BTreeMap<String, Verdict> = cache.files().clone();
    cache.save(false).unwrap();

    let reloaded = VerdictCache::load(&path);
    assert_eq!(reloaded.files(), &expected);
    assert_eq!(reloaded.last_exit(), LastExit::Interrupted);
    assert!(!reloaded.is_new());
}

#[test]
fn test_save_with_prune_keeps_only_keep_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".cache.json");

    let mut cache = filled(&path);
    cache.save(true).unwrap();

    let reloaded = VerdictCache::load(&path);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get("keep.jpg"), Some(&Verdict::Keep));
    assert!(reloaded.get("placeholder.jpg").is_none());
    assert_eq!(reloaded.last_exit(), LastExit::Clean);
}

#[test]
fn test_checkpoint_then_final_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".cache.json");

    let mut cache = filled(&path);
    cache.save(false).unwrap();
    cache.set("late.jpg", Verdict::Keep);
    cache.save(true).unwrap();

    let reloaded = VerdictCache::load(&path);
    let names: Vec<&str> = reloaded.files().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["keep.jpg", "late.jpg"]);
}

#[test]
fn test_missing_file_is_new_cache() {
    let dir = tempdir().unwrap();
    let cache = VerdictCache::load(dir.path().join("absent.json"));
    assert!(cache.is_empty());
    assert!(cache.is_new());
    assert_eq!(cache.last_run(), NEW_CACHE);
    assert_eq!(cache.last_exit(), LastExit::NewCache);
}

#[test]
fn test_last_run_is_stamped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".cache.json");
    let mut cache = VerdictCache::load(&path);
    cache.save(true).unwrap();

    let reloaded = VerdictCache::load(&path);
    let stamp = chrono::DateTime::parse_from_rfc3339(reloaded.last_run());
    assert!(stamp.is_ok(), "not ISO-8601: {}", reloaded.last_run());
}

#[test]
fn test_disabled_cache_never_writes() {
    let mut cache = VerdictCache::open(None);
    cache.set("a.jpg", Verdict::Keep);
    assert!(!cache.is_enabled());
    assert!(cache.save(false).is_ok());
    assert!(cache.path().is_none());
}
