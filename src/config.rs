use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::GalleryMode;
use crate::drive::DEFAULT_API_BASE;
use crate::error::GalleryError;

pub const DEFAULT_CONFIG_FILE: &str = "chart-gallery.json";
pub const DEFAULT_TOKEN_ENV: &str = "CHART_GALLERY_TOKEN";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

const HEXBIN_MANIFEST_ID: &str = "1absVXCyBftpjuYQYY9yWDOBD55REXJHb";
const HEXBIN_FOLDER_ID: &str = "1Jo8J3dCrfFlCWBpuA6S6LuSBEZlYWQiz";
const RATIO_MANIFEST_ID: &str = "1ISKIsGYcA9uV0Xd5eAaScHW5e_0zW38r";
const RATIO_FOLDER_ID: &str = "1OJEmNqsypkt2zSNn7GFM_TB0bHOtnxwA";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub hexbin: Option<SourceConfig>,
    #[serde(default)]
    pub ratio: Option<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Drive {
        #[serde(default)]
        api_base: Option<String>,
        #[serde(default)]
        token_env: Option<String>,
    },
    Directory {
        root: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub manifest: String,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Drive { api_base: String, token_env: String },
    Directory { root: Utf8PathBuf },
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub cache_ttl: Duration,
    pub store: StoreSettings,
    pub hexbin: SourceConfig,
    pub ratio: SourceConfig,
}

impl ResolvedConfig {
    pub fn source(&self, mode: GalleryMode) -> &SourceConfig {
        match mode {
            GalleryMode::Hexbin => &self.hexbin,
            GalleryMode::Ratio => &self.ratio,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GalleryError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| GalleryError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| GalleryError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, GalleryError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let ttl_secs = config.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
        if ttl_secs == 0 {
            return Err(GalleryError::ConfigParse(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }

        let store = match config.store {
            None => StoreSettings::Drive {
                api_base: DEFAULT_API_BASE.to_string(),
                token_env: DEFAULT_TOKEN_ENV.to_string(),
            },
            Some(StoreConfig::Drive {
                api_base,
                token_env,
            }) => StoreSettings::Drive {
                api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                token_env: token_env.unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            },
            Some(StoreConfig::Directory { root }) => StoreSettings::Directory {
                root: Utf8PathBuf::from(root),
            },
        };

        let hexbin = validate_source(
            GalleryMode::Hexbin,
            config.hexbin.unwrap_or_else(|| default_source(GalleryMode::Hexbin)),
        )?;
        let ratio = validate_source(
            GalleryMode::Ratio,
            config.ratio.unwrap_or_else(|| default_source(GalleryMode::Ratio)),
        )?;

        Ok(ResolvedConfig {
            schema_version,
            cache_ttl: Duration::from_secs(ttl_secs),
            store,
            hexbin,
            ratio,
        })
    }
}

pub fn default_source(mode: GalleryMode) -> SourceConfig {
    let (manifest, folder) = match mode {
        GalleryMode::Hexbin => (HEXBIN_MANIFEST_ID, HEXBIN_FOLDER_ID),
        GalleryMode::Ratio => (RATIO_MANIFEST_ID, RATIO_FOLDER_ID),
    };
    SourceConfig {
        manifest: manifest.to_string(),
        folder: folder.to_string(),
    }
}

fn validate_source(mode: GalleryMode, source: SourceConfig) -> Result<SourceConfig, GalleryError> {
    if source.manifest.trim().is_empty() || source.folder.trim().is_empty() {
        return Err(GalleryError::ConfigParse(format!(
            "{mode}: manifest and folder must not be empty"
        )));
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_drive() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.cache_ttl, Duration::from_secs(3600));
        assert_eq!(
            resolved.store,
            StoreSettings::Drive {
                api_base: DEFAULT_API_BASE.to_string(),
                token_env: DEFAULT_TOKEN_ENV.to_string(),
            }
        );
        assert_eq!(resolved.source(GalleryMode::Ratio), &default_source(GalleryMode::Ratio));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = Config {
            cache_ttl_secs: Some(0),
            ..Config::default()
        };
        assert!(ConfigLoader::resolve_config(config).is_err());
    }
}
