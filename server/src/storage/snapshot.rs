//! JSON snapshot file backing a `Database`.
//!
//! The whole document set is rewritten after every committed mutation:
//! serialized to `<path>.tmp`, fsynced, then renamed over `<path>`. A crash
//! mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors that can occur while reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, or `None` if no file exists yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SnapshotError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Atomically replace the snapshot with `value`.
    pub fn store<T: Serialize>(&self, value: &T) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec(value).map_err(|source| SnapshotError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.tmp_path();
        let io_err = |source| SnapshotError::Io {
            path: tmp_path.clone(),
            source,
        };
        let mut file = File::create(&tmp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
