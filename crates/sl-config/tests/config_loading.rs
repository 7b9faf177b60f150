//! Configuration loading + resolution tests against real files.

use sl_config::resolve::{resolve_config, ConfigSource};
use sl_config::{load_settings, ConfigDocument, ConfigError, Settings};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|k| env::var(k).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.keys.iter().zip(self.saved.iter()) {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
fn test_fixture_config_loads_cleanly() {
    let doc = ConfigDocument::load(&fixtures_dir().join("config.yml")).expect("load fixture");
    let (settings, issues) = Settings::from_document(&doc);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    assert_eq!(settings.flush_interval, Duration::from_secs(300));
    assert_eq!(settings.retention.gzip_after_days, 7);
    assert_eq!(settings.retention.delete_after_days, 30);
    assert!(settings.ignore_npcs);

    let rules = doc.rules();
    assert_eq!(rules.len(), 6);
    let (name, block) = &rules.rules[2];
    assert_eq!(name, "BlockBreakEvent");
    assert!(block.enabled);
    assert_eq!(block.conditions.len(), 1);
}

#[test]
fn test_load_settings_returns_rules() {
    let (settings, rules) = load_settings(&fixtures_dir().join("config.yml")).unwrap();
    assert_eq!(settings.command_alert.prefixes, vec!["/op", "/gamemode"]);
    assert!(rules.rules.iter().any(|(n, _)| n == "NoSuchEvent"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ConfigDocument::load(&dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn test_env_config_dir_resolution() {
    let _lock = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let _guard = EnvGuard::new(&["SUPERLOG_CONFIG", "SUPERLOG_CONFIG_DIR"]);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, "save-delay: 10\n").unwrap();
    env::set_var("SUPERLOG_CONFIG_DIR", dir.path());

    let resolved = resolve_config(None);
    assert_eq!(resolved.source, ConfigSource::Environment);
    assert_eq!(resolved.path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_env_path_beats_config_dir() {
    let _lock = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let _guard = EnvGuard::new(&["SUPERLOG_CONFIG", "SUPERLOG_CONFIG_DIR"]);

    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let direct = a.path().join("direct.yml");
    fs::write(&direct, "").unwrap();
    fs::write(b.path().join("config.yml"), "").unwrap();
    env::set_var("SUPERLOG_CONFIG", &direct);
    env::set_var("SUPERLOG_CONFIG_DIR", b.path());

    let resolved = resolve_config(None);
    assert_eq!(resolved.path.as_deref(), Some(direct.as_path()));
}
