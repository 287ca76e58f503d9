use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::errors::StoreError;

/// Durable storage for finished artifacts.
pub trait ArtifactStorage: Send + Sync {
    /// Save everything readable from `source` under `key` and return a
    /// durable reference to it.
    fn store(&self, key: &str, source: &mut dyn Read) -> Result<String, StoreError>;
}

/// Stores artifacts as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ArtifactStorage for LocalStorage {
    fn store(&self, key: &str, source: &mut dyn Read) -> Result<String, StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let tmp_path = temp_path(&path)?;
        if let Err(err) = copy_to(&tmp_path, source) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        if let Err(err) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        if let Some(parent) = path.parent() {
            sync_dir(parent)?;
        }

        Ok(path.display().to_string())
    }
}

fn copy_to(path: &Path, source: &mut dyn Read) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    io::copy(source, &mut file)?;
    file.flush()?;
    file.sync_all()
}

fn temp_path(path: &Path) -> Result<PathBuf, StoreError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidKey(path.display().to_string()))?;
    let tmp_name = format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    );
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}
