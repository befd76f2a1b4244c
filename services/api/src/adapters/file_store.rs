//! services/api/src/adapters/file_store.rs
//!
//! This module contains the disk-backed storage adapter, the concrete
//! implementation of the `KeyValueStore` port from the `core` crate. Each
//! logical record lives in its own `<key>.json` file under the data
//! directory; writes go to a temp file first and are renamed into place, so
//! a reader sees either the old record or the new one, never a partial.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use lumina_core::ports::{KeyValueStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-per-record store implementing the `KeyValueStore` port.
#[derive(Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates the data directory (if needed) and returns the store.
    pub async fn open(root: impl Into<PathBuf>) -> PortResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(io_error)?;
        Ok(Self { root })
    }

    // Keys are the fixed record names from the core crate, never user input.
    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{key}.json.tmp"))
    }
}

fn io_error(err: std::io::Error) -> PortError {
    PortError::Unexpected(err.to_string())
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(self.record_path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(err)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let temp = self.temp_path(key);
        tokio::fs::write(&temp, value).await.map_err(io_error)?;
        tokio::fs::rename(&temp, self.record_path(key))
            .await
            .map_err(io_error)
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        match tokio::fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}
