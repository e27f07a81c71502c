//! File-backed storage.
//!
//! Each key is stored as pretty-printed JSON in `<dir>/<key>.json`. Writes go
//! to a temporary file first and are renamed into place.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tether_engine::{Error, Result, Storage};
use tracing::trace;

/// A [`Storage`] that keeps one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Percent-encode `key` into a file name.
///
/// Only `[A-Za-z0-9-_.~]` survive unescaped, so no key can leave the
/// directory and distinct keys never share a file.
fn file_stem(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Storage(format!("failed to {action} {}: {err}", path.display()))
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("read", &path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| storage_error("parse", &path, e))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(value)?;

        fs::write(&temp_path, data).map_err(|e| storage_error("write", &temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| storage_error("replace", &path, e))?;

        trace!(path = %path.display(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, e)),
        }
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
