use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

use crate::cache::TtlCache;
use crate::config::ResolvedConfig;
use crate::domain::GalleryMode;
use crate::error::GalleryError;
use crate::manifest::{LookupTable, ManifestReport, parse_manifest_report};
use crate::selection::Selection;
use crate::store::{FileMap, FileStore};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub enum ManifestState {
    Unavailable(String),
    Empty(String),
    Ready(Arc<ManifestReport>),
}

impl ManifestState {
    pub fn table(&self) -> Option<&LookupTable> {
        match self {
            ManifestState::Ready(report) => Some(&report.table),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ManifestState::Unavailable(message) | ManifestState::Empty(message) => {
                Some(message.as_str())
            }
            ManifestState::Ready(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileListing {
    pub files: Arc<FileMap>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        filename: String,
        file_id: String,
        bytes: Vec<u8>,
    },
    FetchFailed {
        filename: String,
        file_id: String,
        message: String,
    },
    NotFound {
        filename: String,
        notice: Option<String>,
    },
}

impl Resolution {
    pub fn filename(&self) -> &str {
        match self {
            Resolution::Found { filename, .. }
            | Resolution::FetchFailed { filename, .. }
            | Resolution::NotFound { filename, .. } => filename,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Found { .. } => "found",
            Resolution::FetchFailed { .. } => "fetch_failed",
            Resolution::NotFound { .. } => "not_found",
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Resolution::Found { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Resolution::Found { .. } => None,
            Resolution::FetchFailed { message, .. } => {
                Some(format!("Error downloading image: {message}"))
            }
            Resolution::NotFound { filename, .. } => {
                Some(format!("Graph not found. Looking for: {filename}"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    pub mode: GalleryMode,
    pub manifest: String,
    pub folder: String,
}

pub struct App<S: FileStore> {
    store: S,
    config: ResolvedConfig,
    manifests: TtlCache<String, ManifestReport>,
    listings: TtlCache<String, FileMap>,
}

impl<S: FileStore> App<S> {
    pub fn new(store: S, config: ResolvedConfig) -> Self {
        let ttl = config.cache_ttl;
        Self {
            store,
            config,
            manifests: TtlCache::new(ttl),
            listings: TtlCache::new(ttl),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn modes(&self) -> Vec<ModeSummary> {
        GalleryMode::ALL
            .iter()
            .map(|mode| {
                let source = self.config.source(*mode);
                ModeSummary {
                    mode: *mode,
                    manifest: source.manifest.clone(),
                    folder: source.folder.clone(),
                }
            })
            .collect()
    }

    pub fn manifest(&self, mode: GalleryMode, sink: &dyn ProgressSink) -> ManifestState {
        let reference = self.config.source(mode).manifest.clone();
        let started = Instant::now();
        let loaded = self.manifests.get_or_try_insert_with(&reference, || {
            sink.event(ProgressEvent {
                message: format!("loading {mode} manifest {reference}"),
                elapsed: None,
            });
            let content = self.store.fetch(&reference)?;
            let text = String::from_utf8_lossy(&content);
            Ok::<_, GalleryError>(parse_manifest_report(text.lines()))
        });

        match loaded {
            Err(err) => {
                warn!(%mode, error = %err, "manifest unavailable");
                let message = format!("Could not load manifest '{reference}': {err}");
                sink.event(ProgressEvent {
                    message: message.clone(),
                    elapsed: Some(started.elapsed()),
                });
                ManifestState::Unavailable(message)
            }
            Ok(report) if report.table.is_empty() => {
                let message = format!("Manifest '{reference}' was found but could not parse data");
                sink.event(ProgressEvent {
                    message: message.clone(),
                    elapsed: Some(started.elapsed()),
                });
                ManifestState::Empty(message)
            }
            Ok(report) => {
                if !report.skipped.is_empty() {
                    sink.event(ProgressEvent {
                        message: format!(
                            "{mode} manifest: {} lines parsed, {} skipped",
                            report.parsed,
                            report.skipped.len()
                        ),
                        elapsed: None,
                    });
                }
                ManifestState::Ready(report)
            }
        }
    }

    pub fn file_listing(&self, mode: GalleryMode, sink: &dyn ProgressSink) -> FileListing {
        let folder = self.config.source(mode).folder.clone();
        let started = Instant::now();
        let listed = self.listings.get_or_try_insert_with(&folder, || {
            sink.event(ProgressEvent {
                message: format!("listing {mode} folder {folder}"),
                elapsed: None,
            });
            self.store.list(&folder)
        });

        match listed {
            Ok(files) => FileListing {
                files,
                notice: None,
            },
            Err(err) => {
                warn!(%mode, error = %err, "folder listing failed");
                let message = format!("Error listing files: {err}");
                sink.event(ProgressEvent {
                    message: message.clone(),
                    elapsed: Some(started.elapsed()),
                });
                FileListing {
                    files: Arc::new(FileMap::new()),
                    notice: Some(message),
                }
            }
        }
    }

    pub fn resolve(
        &self,
        mode: GalleryMode,
        selection: &Selection,
        sink: &dyn ProgressSink,
    ) -> Resolution {
        let filename = selection.filename(mode);
        let listing = self.file_listing(mode, sink);

        let Some(file_id) = listing.files.get(&filename).cloned() else {
            sink.event(ProgressEvent {
                message: format!("graph not found: {filename}"),
                elapsed: None,
            });
            return Resolution::NotFound {
                filename,
                notice: listing.notice,
            };
        };

        let started = Instant::now();
        match self.store.fetch(&file_id) {
            Ok(bytes) => {
                sink.event(ProgressEvent {
                    message: format!("fetched {filename} ({} bytes)", bytes.len()),
                    elapsed: Some(started.elapsed()),
                });
                Resolution::Found {
                    filename,
                    file_id,
                    bytes,
                }
            }
            Err(err) => {
                warn!(%filename, error = %err, "image download failed");
                sink.event(ProgressEvent {
                    message: format!("download failed for {filename}: {err}"),
                    elapsed: Some(started.elapsed()),
                });
                Resolution::FetchFailed {
                    filename,
                    file_id,
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn invalidate(&self) {
        self.manifests.invalidate_all();
        self.listings.invalidate_all();
    }
}
