use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::repository::{DocumentStorage, StorageError};

/// Filesystem-backed document storage rooted at a fixed directory.
///
/// Keys handed to the trait are opaque relative paths; absolute keys and
/// parent components are refused so a key can never escape the root.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let unsafe_key = relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir));
        if unsafe_key {
            return Err(StorageError::Backend(format!("unsafe storage key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStorage for DiskStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match fs::metadata(self.resolve(path)?) {
            Ok(_) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(StorageError::Backend(error.to_string())),
        }
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        match fs::metadata(self.resolve(path)?) {
            Ok(metadata) => Ok(metadata.len()),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(error) => Err(StorageError::Backend(error.to_string())),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|error| StorageError::Backend(error.to_string()))?;
        }
        fs::write(target, bytes).map_err(|error| StorageError::Backend(error.to_string()))
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.resolve(path)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(error) => Err(StorageError::Backend(error.to_string())),
        }
    }
}
