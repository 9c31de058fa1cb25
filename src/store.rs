use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;
use tracing::{debug, info};

use crate::error::GalleryError;

pub type FileMap = BTreeMap<String, String>;

pub trait FileStore: Send + Sync {
    fn list(&self, folder: &str) -> Result<FileMap, GalleryError>;
    fn fetch(&self, id: &str) -> Result<Vec<u8>, GalleryError>;
}

impl<T: FileStore + ?Sized> FileStore for Box<T> {
    fn list(&self, folder: &str) -> Result<FileMap, GalleryError> {
        (**self).list(folder)
    }

    fn fetch(&self, id: &str) -> Result<Vec<u8>, GalleryError> {
        (**self).fetch(id)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: Utf8PathBuf,
}

impl DirectoryStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, relative: &str) -> Result<Utf8PathBuf, GalleryError> {
        join_within(&self.root, relative)
    }
}

impl FileStore for DirectoryStore {
    fn list(&self, folder: &str) -> Result<FileMap, GalleryError> {
        let dir = self.resolve(folder)?;
        let entries = fs::read_dir(dir.as_std_path())
            .map_err(|err| GalleryError::Filesystem(format!("read {dir}: {err}")))?;
        let mut files = FileMap::new();
        for entry in entries {
            let entry = entry.map_err(|err| GalleryError::Filesystem(err.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let id = Utf8Path::new(folder).join(&name).to_string();
            files.insert(name, id);
        }
        debug!(%dir, files = files.len(), "listed local folder");
        Ok(files)
    }

    fn fetch(&self, id: &str) -> Result<Vec<u8>, GalleryError> {
        let path = self.resolve(id)?;
        fs::read(path.as_std_path())
            .map_err(|err| GalleryError::Filesystem(format!("read {path}: {err}")))
    }
}

#[derive(Debug, Clone)]
pub struct SavedImages {
    root: Utf8PathBuf,
}

impl SavedImages {
    pub fn new() -> Result<Self, GalleryError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("chart-gallery")
                        .join("images"),
                )
                .ok()
            })
            .ok_or_else(|| {
                GalleryError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn path_for(&self, filename: &str) -> Result<Utf8PathBuf, GalleryError> {
        join_within(&self.root, filename)
    }

    pub fn save(&self, filename: &str, content: &[u8]) -> Result<Utf8PathBuf, GalleryError> {
        let dest = self.path_for(filename)?;
        write_atomic(&dest, content)?;
        info!(path = %dest, bytes = content.len(), "saved chart");
        Ok(dest)
    }
}

fn join_within(root: &Utf8Path, relative: &str) -> Result<Utf8PathBuf, GalleryError> {
    let relative = Utf8Path::new(relative);
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir));
    if relative.as_str().is_empty() || escapes {
        return Err(GalleryError::Filesystem(format!(
            "path escapes {root}: {relative}"
        )));
    }
    Ok(root.join(relative))
}

pub fn write_atomic(dest: &Utf8Path, content: &[u8]) -> Result<(), GalleryError> {
    let parent = dest
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
    let temp = Builder::new()
        .prefix("chart-gallery")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), content).map_err(|err| GalleryError::Filesystem(err.to_string()))?;
    temp.persist(dest.as_std_path())
        .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
    Ok(())
}
