use serde::{de::DeserializeOwned, Serialize};
use std::fs::{create_dir_all, read, write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[error("corrupt record {key}: {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },
}

/// Directory of JSON documents, one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir).map_err(|source| StoreError::Io {
            op: "create_dir_all",
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut fname = String::with_capacity(key.len());
        for ch in key.chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                fname.push(ch);
            } else {
                fname.push('_');
            }
        }
        self.dir.join(format!("{fname}.json"))
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let data = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        write(&path, data).map_err(|source| StoreError::Io {
            op: "write",
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = read(&path).map_err(|source| StoreError::Io {
            op: "read",
            path: path.display().to_string(),
            source,
        })?;
        let v = serde_json::from_slice::<T>(&data).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(v))
    }
}
