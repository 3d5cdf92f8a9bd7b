//! In-memory state store.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use locshare_core::traits::{StateStore, StoreError};

/// In-memory storage implementation.
///
/// Useful for tests and headless runs.
/// Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `pairs`.
    #[must_use]
    pub fn with_values<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Snapshot of every stored pair.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn snapshot(&self) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .values
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .clone())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .remove(key);
        Ok(())
    }
}
