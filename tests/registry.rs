use ds_cache_registry::{
    CacheInfo, CacheRegistry, EntryMetadata, Metadata, MetadataManager, PartData, PartInfo,
    RegistryError,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn temp_cache() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let cache = temp.path().join("cache");
    fs::create_dir(&cache).unwrap();
    (temp, cache)
}

fn read_json(path: &Path) -> Value {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).expect("valid json document")
}

#[test]
fn register_part_and_entry_scenario() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "Test library");

    registry.register_part("models", "Model files").unwrap();
    registry
        .register_entry("models", "bert-base", "BERT model", Some(1_000_000), Metadata::new())
        .unwrap();

    let entries = registry.list_entries("models").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "bert-base");
    assert_eq!(entries[0].description, "BERT model");
    assert_eq!(entries[0].size, Some(1_000_000));
    assert!(entries[0].created.is_some());
    assert!(entries[0].last_access.is_some());
}

#[test]
fn register_part_twice_keeps_one() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");

    registry.register_part("models", "").unwrap();
    registry.register_part("models", "").unwrap();

    let parts = registry.list_parts().unwrap();
    assert_eq!(parts, vec![PartInfo::new("models", "")]);
}

#[test]
fn register_entry_twice_replaces() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");

    registry
        .register_entry("models", "m", "first", None, Metadata::new())
        .unwrap();
    let first = registry.get_entry("models", "m").unwrap().unwrap();
    registry
        .register_entry("models", "m", "second", None, Metadata::new())
        .unwrap();

    let entries = registry.list_entries("models").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].description, "second");
    assert!(entries[0].created >= first.created);
    assert!(entries[0].last_access >= first.last_access);
}

#[test]
fn touch_never_decreases_last_access() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry.register_part("models", "").unwrap();
    registry
        .register_entry("models", "model1", "", None, Metadata::new())
        .unwrap();

    let initial = registry
        .get_entry("models", "model1")
        .unwrap()
        .and_then(|e| e.last_access)
        .expect("last_access set on register");

    assert!(registry.touch("models", "model1").unwrap());

    let touched = registry
        .get_entry("models", "model1")
        .unwrap()
        .and_then(|e| e.last_access)
        .expect("last_access still set");
    assert!(touched >= initial);
}

#[test]
fn remove_then_get_is_absent() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry.register_part("models", "").unwrap();
    registry
        .register_entry("models", "model1", "", None, Metadata::new())
        .unwrap();
    registry
        .register_entry("models", "model2", "", None, Metadata::new())
        .unwrap();

    assert!(registry.remove("models", "model1").unwrap());
    assert!(registry.get_entry("models", "model1").unwrap().is_none());

    let remaining = registry.list_entries("models").unwrap();
    assert!(!registry.remove("models", "model1").unwrap());
    assert_eq!(registry.list_entries("models").unwrap(), remaining);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].path, "model2");
}

#[test]
fn update_size_changes_only_size() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry.register_part("models", "").unwrap();
    registry
        .register_entry("models", "model1", "weights", Some(1000), Metadata::new())
        .unwrap();

    assert!(registry.update_size("models", "model1", 2000).unwrap());

    let entry = registry.get_entry("models", "model1").unwrap().unwrap();
    assert_eq!(entry.size, Some(2000));
    assert_eq!(entry.description, "weights");
}

#[test]
fn unknown_part_is_empty() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");

    assert!(registry.list_parts().unwrap().is_empty());
    assert!(registry.list_entries("does-not-exist").unwrap().is_empty());
    assert!(registry.get_entry("does-not-exist", "m").unwrap().is_none());
    assert!(!registry.remove("does-not-exist", "m").unwrap());
}

#[test]
fn manager_remove_entry_keeps_order() {
    let (_temp, cache) = temp_cache();
    let manager = MetadataManager::new(&cache);
    manager
        .write_part(
            "models",
            &PartData::new(vec![
                EntryMetadata::new("model1"),
                EntryMetadata::new("model2"),
                EntryMetadata::new("model3"),
            ]),
        )
        .unwrap();

    assert!(manager.remove_entry("models", "model1").unwrap());

    let paths: Vec<_> = manager
        .read_part("models")
        .unwrap()
        .unwrap()
        .entries
        .into_iter()
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, vec!["model2", "model3"]);
}

#[test]
fn documents_on_disk_are_minimal() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "Test library");
    registry.register_part("models", "Model files").unwrap();
    registry.register_part("datasets", "").unwrap();
    registry
        .manager()
        .add_entry("models", EntryMetadata::new("bert-base"), true)
        .unwrap();

    let info = read_json(&cache.join(".cache-registry").join("info.json"));
    assert_eq!(
        info,
        json!({
            "version": 1,
            "library": "test-lib",
            "description": "Test library",
            "parts": [
                {"name": "models", "description": "Model files"},
                {"name": "datasets"},
            ],
        })
    );

    let part = read_json(&cache.join(".cache-registry").join("parts").join("models.json"));
    assert_eq!(part, json!({"entries": [{"path": "bert-base"}]}));
}

#[test]
fn hand_written_documents_are_read() {
    let (_temp, cache) = temp_cache();
    let parts = cache.join(".cache-registry").join("parts");
    fs::create_dir_all(&parts).unwrap();
    fs::write(
        cache.join(".cache-registry").join("info.json"),
        r#"{"library": "hf-hub", "parts": [{"name": "models"}]}"#,
    )
    .unwrap();
    fs::write(
        parts.join("models.json"),
        r#"{"entries": [{"path": "gpt2", "last_access": "2024-01-20T14:00:00", "metadata": {"sha": "abc"}}]}"#,
    )
    .unwrap();

    let registry = CacheRegistry::new(&cache, "hf-hub", "");
    let info = registry.info().unwrap().unwrap();
    assert_eq!(info, CacheInfo::new("hf-hub", "").with_parts(vec![PartInfo::new("models", "")]));

    let entry = registry.get_entry("models", "gpt2").unwrap().unwrap();
    assert_eq!(entry.metadata["sha"], "abc");
    assert!(entry.created.is_none());
    assert_eq!(
        entry.last_access.map(|ts| ts.to_string()),
        Some("2024-01-20 14:00:00".to_string())
    );
}

#[test]
fn corrupted_part_fails_loudly() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry
        .register_entry("models", "m", "", None, Metadata::new())
        .unwrap();
    fs::write(
        cache.join(".cache-registry").join("parts").join("models.json"),
        r#"{"entries": [{"description": "no path"}]}"#,
    )
    .unwrap();

    let err = registry.list_entries("models").unwrap_err();
    assert!(matches!(err, RegistryError::DataCorruption { .. }));
    assert!(registry.manager().get_all_parts().is_err());
}

#[test]
fn non_utf8_part_is_corruption() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry
        .register_entry("models", "m", "", None, Metadata::new())
        .unwrap();
    fs::write(
        cache.join(".cache-registry").join("parts").join("models.json"),
        b"{\"entries\":[{\"path\":\"\xff\xfe\"}]}",
    )
    .unwrap();

    let err = registry.list_entries("models").unwrap_err();
    assert!(err.is_corruption(), "expected corruption, got {err:?}");
}

#[test]
fn get_all_parts_reflects_persisted_parts() {
    let (_temp, cache) = temp_cache();
    let registry = CacheRegistry::new(&cache, "test-lib", "");
    registry.register_part("models", "").unwrap();
    registry.register_part("datasets", "").unwrap();
    registry
        .register_entry("datasets", "squad", "", Some(10), Metadata::new())
        .unwrap();

    let all = registry.manager().get_all_parts().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["datasets"].total_size(), 10);
}
