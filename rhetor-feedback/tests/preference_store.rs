//! Integration tests for the file-backed preference store.

use rhetor_feedback::{FilePreferenceStore, PreferenceStore, SensitivityLevel};

#[test]
fn round_trip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let store = FilePreferenceStore::new(path.clone());
    store.save(SensitivityLevel::High).unwrap();
    assert_eq!(store.load(), SensitivityLevel::High);

    // A new store over the same file sees the persisted value.
    let reopened = FilePreferenceStore::new(path);
    assert_eq!(reopened.load(), SensitivityLevel::High);
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("prefs.json");

    let store = FilePreferenceStore::new(path.clone());
    store.save(SensitivityLevel::Low).unwrap();
    assert!(path.exists());
    assert_eq!(store.load(), SensitivityLevel::Low);
}

#[test]
fn corrupt_document_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let store = FilePreferenceStore::new(path);
    assert_eq!(store.load(), SensitivityLevel::Medium);
}

#[test]
fn unknown_level_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(
        &path,
        r#"{"sensitivity": "EXTREME", "updated_at": "2026-01-15T10:00:00Z"}"#,
    )
    .unwrap();

    let store = FilePreferenceStore::new(path);
    assert_eq!(store.load(), SensitivityLevel::Medium);
}

#[test]
fn last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let store = FilePreferenceStore::new(path.clone());
    store.save(SensitivityLevel::Low).unwrap();
    store.save(SensitivityLevel::High).unwrap();

    let reopened = FilePreferenceStore::new(path);
    assert_eq!(reopened.load(), SensitivityLevel::High);
}

#[test]
fn document_records_update_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let store = FilePreferenceStore::new(path.clone());
    store.save(SensitivityLevel::Medium).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["sensitivity"], "MEDIUM");
    assert!(doc["updated_at"].is_string());
}
