//! Blob store with pluggable backends
//!
//! All ledger state lives in a key/value object store keyed by hierarchical
//! string paths. The store has last-write-wins semantics and no transactions.
//!
//! # Architecture
//!
//! - `BlobStore` trait defines the interface for storage backends
//! - `LocalStore` keeps objects as files under a root directory
//! - `MemoryStore` keeps objects in process (tests, dry runs)
//!
//! # Layout
//!
//! See [`keys`] for the exact object paths.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod keys;
mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// An object returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub body: Vec<u8>,
}

/// Trait for blob storage backends
///
/// Implementations handle storing objects in different locations:
/// - Local filesystem
/// - In-process memory
pub trait BlobStore: Send + Sync {
    /// Human-readable name for this store
    fn name(&self) -> &str;

    /// Fetch an object, `None` if the key does not exist
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, replacing any previous value
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// All objects whose key starts with `prefix`, sorted by key
    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>>;
}

/// Typed JSON helpers for any blob store
pub trait BlobStoreExt: BlobStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let body = serde_json::to_vec(value)?;
        self.put(key, &body)
    }
}

impl<S: BlobStore + ?Sized> BlobStoreExt for S {}

/// Which backend to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Local,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fs" | "file" => Ok(Self::Local),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(Error::Config(format!("Unknown store backend: {}", other))),
        }
    }
}

/// Store section of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Root directory for the local backend
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Open the configured store
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Local => {
            let root = config.path.clone().unwrap_or_else(default_store_dir);
            Ok(Arc::new(LocalStore::new(root)?))
        }
    }
}

/// Default store directory
pub fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pocket")
        .join("store")
}

/// Reject keys that could escape a store root or collide with directories
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(Error::Store(format!("Invalid key: {:?}", key)));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            return Err(Error::Store(format!("Invalid key: {:?}", key)));
        }
    }
    Ok(())
}
