//! Unit preference persistence across restarts.

use material_tracker::domain::{TrackerError, UnitType};
use material_tracker::preferences::{JsonPreferences, PreferenceStore};
use material_tracker::remote::InMemoryStore;
use material_tracker::worker::{spawn_pipeline, StaticConfirmation};
use material_tracker::Config;
use std::sync::Arc;

fn config_in(dir: &tempfile::TempDir) -> Config {
    Config {
        data_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..Default::default()
    }
}

#[tokio::test]
async fn chosen_unit_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let store = Arc::new(InMemoryStore::new());

    let first = spawn_pipeline(
        &config,
        store.clone(),
        Arc::new(JsonPreferences::new(config.preferences_path()).unwrap()),
        Arc::new(StaticConfirmation(false)),
    )
    .await
    .unwrap();
    assert_eq!(first.view().unit, UnitType::Grams);
    first.set_unit(UnitType::Kilograms).await.unwrap();
    first.shutdown().await.unwrap();

    let second = spawn_pipeline(
        &config,
        store,
        Arc::new(JsonPreferences::new(config.preferences_path()).unwrap()),
        Arc::new(StaticConfirmation(false)),
    )
    .await
    .unwrap();
    assert_eq!(second.view().unit, UnitType::Kilograms);
    second.shutdown().await.unwrap();
}

#[tokio::test]
async fn unrecognised_stored_unit_falls_back_to_grams() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, r#"{"version": 1, "unit": "stone"}"#).unwrap();

    let prefs = JsonPreferences::new(path).unwrap();
    assert_eq!(prefs.get_unit().await, UnitType::Grams);
}

#[tokio::test]
async fn corrupt_file_falls_back_to_grams_and_is_replaced_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, "{ not json").unwrap();

    let prefs = JsonPreferences::new(path.clone()).unwrap();
    assert_eq!(prefs.get_unit().await, UnitType::Grams);

    prefs.set_unit(UnitType::Pounds).await.unwrap();
    assert_eq!(prefs.get_unit().await, UnitType::Pounds);

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["unit"], "pounds");
    assert_eq!(raw["version"], 1);
}

#[tokio::test]
async fn unwritable_location_reports_an_error() {
    let dir = tempfile::tempdir().unwrap();
    // a directory where the file should be makes the final rename fail
    let path = dir.path().join("preferences.json");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep"), "x").unwrap();

    let prefs = JsonPreferences::new(path).unwrap();
    let err = prefs.set_unit(UnitType::Kilograms).await.unwrap_err();
    assert!(matches!(err, TrackerError::Io(_)));
}
