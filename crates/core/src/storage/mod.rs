//! Key-value persistence adapter.
//!
//! Stores address opaque string values by string key. Business state is
//! serialised as JSON text by the components that own it; the adapter never
//! interprets the values it holds.

use std::{path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Directory-backed store writing a single JSON document.
pub mod file;
/// Process-local store used for tests and ephemeral sessions.
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the JSON array of owned products.
pub const OWNED_PRODUCTS_KEY: &str = "ownedProducts";
/// Key holding the coin balance as a JSON integer.
pub const COIN_BALANCE_KEY: &str = "coinBalance";
/// Key holding the display preference literal.
pub const PREFERENCE_MODE_KEY: &str = "preferenceMode";

/// Shared handle to a persistence backend.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Failures raised by a persistence backend or while decoding stored values.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem access failed.
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        /// File or directory that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A value could not be serialised for storage.
    #[error("failed to encode value for key `{key}`: {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// Serialiser error.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value exists but cannot be decoded.
    #[error("stored value for key `{key}` is corrupt: {reason}")]
    Corrupt {
        /// Key that was read.
        key: String,
        /// Decoder message.
        reason: String,
    },
    /// The backend refused the operation.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal key-value contract consumed by the stores.
///
/// All methods take `&self`; implementations use interior mutability.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, returning `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Insert or replace a single value.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    /// Write several values as one operation.
    ///
    /// The default writes entries one at a time; backends that can commit a
    /// batch atomically override it.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), PersistenceError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Typed JSON helpers layered over any [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and decode a JSON value.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.get(key)? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON value.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let encoded = encode(key, value)?;
        self.set(key, &encoded)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Serialise `value` to JSON text for storage under `key`.
pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|source| PersistenceError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Decode JSON text previously stored under `key`.
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, PersistenceError> {
    serde_json::from_str(raw).map_err(|err| PersistenceError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    })
}
