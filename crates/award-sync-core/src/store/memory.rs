//! In-memory [`ProcessedStore`] implementation for tests and dry runs.
//!
//! Keeps the key set behind `std::sync::RwLock` and, separately, the
//! sequence of keys actually appended, so callers can assert that nothing
//! was written twice.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::ProcessedStore;

/// In-memory processed-record set.
pub struct InMemoryProcessedStore {
    keys: RwLock<HashSet<String>>,
    appended: RwLock<Vec<String>>,
}

impl InMemoryProcessedStore {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            appended: RwLock::new(Vec::new()),
        }
    }

    /// A store pre-seeded with keys from an earlier run. Seeded keys are not
    /// counted as appended.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: RwLock::new(keys.into_iter().map(Into::into).collect()),
            appended: RwLock::new(Vec::new()),
        }
    }

    /// Keys appended through [`ProcessedStore::add`], in order.
    pub fn appended(&self) -> Vec<String> {
        self.appended
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("processed set lock poisoned")
}

impl Default for InMemoryProcessedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessedStore for InMemoryProcessedStore {
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.keys.read().map_err(poisoned)?.contains(key))
    }

    async fn add(&self, key: &str) -> Result<bool> {
        let mut keys = self.keys.write().map_err(poisoned)?;
        if !keys.insert(key.to_string()) {
            return Ok(false);
        }
        self.appended.write().map_err(poisoned)?.push(key.to_string());
        Ok(true)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.keys.read().map_err(poisoned)?.len())
    }
}
