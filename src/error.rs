use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GalleryError {
    #[error("invalid threshold: {0} (expected an integer in 0..=9)")]
    InvalidThreshold(String),

    #[error("invalid gallery mode: {0} (expected hexbin or ratio)")]
    InvalidMode(String),

    #[error("unknown selection: {0}")]
    UnknownSelection(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("authentication error: {0}")]
    #[diagnostic(help("export an access token in the variable named by store.token_env"))]
    Authentication(String),

    #[error("file store request failed: {0}")]
    StoreHttp(String),

    #[error("file store returned status {status}: {message}")]
    StoreStatus { status: u16, message: String },

    #[error("manifest unavailable: {0}")]
    ManifestUnavailable(String),

    #[error("graph not found: {0}")]
    GraphNotFound(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
