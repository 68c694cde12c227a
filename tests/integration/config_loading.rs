//! Integration tests for settings discovery and precedence.

use std::path::PathBuf;

use snag::config::{Overrides, Settings};
use snag::error::SnagError;
use tempfile::TempDir;

use crate::common::env::with_config_home;

fn write_default_config(config_home: &TempDir, name: &str, content: &str) -> PathBuf {
    let dir = config_home.path().join("snagcap");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[cfg(target_os = "linux")]
#[test]
fn test_default_config_file_is_discovered() {
    let config_home = TempDir::new().unwrap();
    let path = write_default_config(
        &config_home,
        "config.toml",
        "data_dir = \"/srv/snags\"\njpeg_quality = 65\nsweep_on_start = true\n",
    );
    let _env = with_config_home(&config_home.path().display().to_string());

    let settings = Settings::load(&Overrides::default()).unwrap();
    assert_eq!(settings.data_dir, PathBuf::from("/srv/snags"));
    assert_eq!(settings.jpeg_quality, 65);
    assert!(settings.sweep_on_start);
    assert_eq!(settings.source, Some(path));
}

#[cfg(target_os = "linux")]
#[test]
fn test_toml_preferred_over_yaml() {
    let config_home = TempDir::new().unwrap();
    write_default_config(&config_home, "config.yaml", "jpeg_quality: 10\n");
    write_default_config(&config_home, "config.toml", "jpeg_quality = 20\n");
    let _env = with_config_home(&config_home.path().display().to_string());

    let settings = Settings::load(&Overrides::default()).unwrap();
    assert_eq!(settings.jpeg_quality, 20);
}

#[cfg(target_os = "linux")]
#[test]
fn test_missing_default_config_means_defaults() {
    let config_home = TempDir::new().unwrap();
    let _env = with_config_home(&config_home.path().display().to_string());

    let settings = Settings::load(&Overrides {
        data_dir: Some(PathBuf::from("/tmp/snag-defaults")),
        ..Overrides::default()
    })
    .unwrap();
    assert_eq!(settings.jpeg_quality, 80);
    assert!(!settings.sweep_on_start);
    assert!(settings.source.is_none());
}

#[cfg(target_os = "linux")]
#[test]
fn test_invalid_default_config_is_an_error() {
    let config_home = TempDir::new().unwrap();
    write_default_config(&config_home, "config.yml", "jpeg_quality: 150\n");
    let _env = with_config_home(&config_home.path().display().to_string());

    let err = Settings::load(&Overrides::default()).unwrap_err();
    assert!(matches!(err, SnagError::ConfigInvalid(_)));
}

#[test]
fn test_flag_overrides_explicit_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("site.toml");
    std::fs::write(&path, "data_dir = \"from-file\"\njpeg_quality = 40\n").unwrap();

    let settings = Settings::load(&Overrides {
        config: Some(path),
        data_dir: Some(temp.path().join("from-flag")),
        jpeg_quality: Some(95),
    })
    .unwrap();
    assert_eq!(settings.data_dir, temp.path().join("from-flag"));
    assert_eq!(settings.jpeg_quality, 95);
}
