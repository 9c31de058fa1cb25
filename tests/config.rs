use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use chart_gallery::config::{Config, ConfigLoader, StoreConfig, StoreSettings, default_source};
use chart_gallery::domain::GalleryMode;
use chart_gallery::error::GalleryError;

#[test]
fn reads_directory_store_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart-gallery.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "cache_ttl_secs": 60,
            "store": { "kind": "directory", "root": "/srv/charts" },
            "hexbin": { "manifest": "hexbin/manifest.txt", "folder": "hexbin" }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.cache_ttl, Duration::from_secs(60));
    assert_eq!(
        resolved.store,
        StoreSettings::Directory {
            root: Utf8PathBuf::from("/srv/charts")
        }
    );
    assert_eq!(resolved.source(GalleryMode::Hexbin).folder, "hexbin");
    assert_eq!(
        resolved.source(GalleryMode::Ratio),
        &default_source(GalleryMode::Ratio)
    );
}

#[test]
fn drive_store_fills_missing_fields() {
    let config = Config {
        store: Some(StoreConfig::Drive {
            api_base: Some("http://127.0.0.1:9000/drive/v3".to_string()),
            token_env: None,
        }),
        ..Config::default()
    };
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_matches!(
        resolved.store,
        StoreSettings::Drive { api_base, token_env }
            if api_base == "http://127.0.0.1:9000/drive/v3" && token_env == "CHART_GALLERY_TOKEN"
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(GalleryError::ConfigRead(_))
    );
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart-gallery.json");
    fs::write(&path, "{ \"store\": { \"kind\": \"ftp\" } }").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(GalleryError::ConfigParse(_))
    );
}

#[test]
fn blank_source_is_rejected() {
    let config: Config =
        serde_json::from_str(r#"{ "ratio": { "manifest": " ", "folder": "x" } }"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(GalleryError::ConfigParse(message)) if message.contains("ratio")
    );
}
