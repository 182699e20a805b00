// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON documents for clash runs: the run config going in, the report
//! coming out.
//!
//! The engine never touches the filesystem directly. Documents are addressed
//! by path-like keys and go through a [`ConfigStore`].

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Byte-level document storage.
pub trait ConfigStore {
    /// Bytes stored under `key`; [`ConfigError::NotFound`] when absent.
    fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure to read, write or accept a document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no document at `{0}`")]
    NotFound(String),
    /// The store could not be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The document is not valid JSON for the expected type.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed but its values are unusable.
    #[error("{0}")]
    Invalid(String),
}

/// Typed JSON access over a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The document under `key`, or `None` when it is absent or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.read(key) {
            Ok(bytes) if bytes.is_empty() => return Ok(None),
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// The document under `key`; absence is an error.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.load(key)?
            .ok_or_else(|| ConfigError::NotFound(key.to_owned()))
    }

    /// Writes `value` as pretty-printed JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.write(key, &data)
    }
}

/// Documents as files below a base directory. Absolute keys are used as-is.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// A store rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// A store rooted at the process working directory.
    pub fn current_dir() -> Result<Self, ConfigError> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

impl ConfigStore for FsConfigStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        fs::read(self.base.join(key)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(key.to_owned()),
            _ => ConfigError::Io(err),
        })
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.base.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}
