//! Integration tests for configuration loading and hot reload

mod support;

use std::path::Path;
use std::time::{Duration, SystemTime};

use uplinkbridge_domain::ConfigError;
use uplinkbridge_infra::config::{load_from_file, ConfigHandle};

use support::config_toml;

/// Write `contents` and push the mtime forward so the change is visible even
/// on filesystems with coarse timestamps
fn rewrite(path: &Path, contents: &str, offset_secs: u64) {
    std::fs::write(path, contents).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs)).unwrap();
}

#[test]
fn test_load_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, config_toml("parameters = [40004]\ninterval = 30")).unwrap();

    let config = load_from_file(&path).unwrap();
    assert_eq!(config.parameters, vec![40004]);
    assert_eq!(config.interval, 30);
    assert_eq!(config.mqtt_port, 1883);
}

#[test]
fn test_load_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.json");
    std::fs::write(
        &path,
        r#"{"client_id": "abc", "client_secret": "s", "system_id": 7, "mqtt_host": "h", "scaling": {"40940": 10}}"#,
    )
    .unwrap();

    let config = load_from_file(&path).unwrap();
    assert_eq!(config.system_id, 7);
    assert_eq!(config.scale_overrides().unwrap().get(&40940), Some(&10.0));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, config_toml("interval = 0")).unwrap();

    assert!(matches!(load_from_file(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_unchanged_file_reports_no_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, config_toml("")).unwrap();

    let handle = ConfigHandle::load(&path).unwrap();
    assert!(handle.reload_if_changed().unwrap().is_none());
}

#[test]
fn test_rewritten_file_is_swapped_in() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, config_toml("interval = 60")).unwrap();

    let handle = ConfigHandle::load(&path).unwrap();
    let before = handle.snapshot();

    rewrite(&path, &config_toml("interval = 15"), 5);
    let reloaded = handle.reload_if_changed().unwrap().unwrap();

    assert_eq!(reloaded.interval, 15);
    assert_eq!(handle.snapshot().interval, 15);
    // Readers holding the old snapshot keep it intact
    assert_eq!(before.interval, 60);
    assert!(handle.reload_if_changed().unwrap().is_none());
}

#[test]
fn test_invalid_rewrite_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, config_toml("interval = 60")).unwrap();
    let handle = ConfigHandle::load(&path).unwrap();

    rewrite(&path, "client_id = [", 5);
    assert!(matches!(handle.reload_if_changed(), Err(ConfigError::Parse(_))));
    assert_eq!(handle.snapshot().interval, 60);

    // Not retried until the file changes again
    assert!(handle.reload_if_changed().unwrap().is_none());

    rewrite(&path, &config_toml("interval = 45"), 10);
    assert_eq!(handle.reload_if_changed().unwrap().map(|c| c.interval), Some(45));
}

#[test]
fn test_fixed_handle_never_reloads() {
    let handle = ConfigHandle::fixed(support::config(""));
    assert!(handle.path().is_none());
    assert!(handle.reload_if_changed().unwrap().is_none());
}
