// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Document store kept in memory, for runs that write their report without
//! touching the filesystem.

use clash_core::config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory [`ConfigStore`].
///
/// Clones share state, so a test can hand one clone to the engine and read
/// the written report through another.
///
/// # Example
///
/// ```
/// use clash_dry_tests::InMemoryConfigStore;
/// use clash_core::config::ConfigService;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// service.save("results.json", &serde_json::json!({"clashes": []})).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.get("results.json").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Documents>>,
}

#[derive(Debug, Default)]
struct Documents {
    data: HashMap<String, Vec<u8>>,
    saves: usize,
    reject_writes: bool,
}

impl InMemoryConfigStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> MutexGuard<'_, Documents> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every following write fail with an I/O error.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.documents().reject_writes = fail;
    }

    /// Number of writes attempted, failed ones included.
    pub fn save_count(&self) -> usize {
        self.documents().saves
    }

    /// Bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.documents().data.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.documents()
            .data
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_owned()))
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut docs = self.documents();
        docs.saves += 1;
        if docs.reject_writes {
            return Err(io::Error::other("store rejected the write").into());
        }
        docs.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
