//! Processed-record store abstraction.
//!
//! The [`ProcessedStore`] trait is the idempotency set the sync pipeline
//! consults before matching a funding record and appends to after each
//! attempt. Keys are registry `update_url`s.
//!
//! The set only grows: there is no removal operation, and an `add` of a key
//! already present must not write a duplicate entry. Lookups are expected to
//! be O(1) so a walk over thousands of records stays linear.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Append-only set of already-synchronized record keys.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`reload`](ProcessedStore::reload) | Re-read persisted keys at the start of a run |
/// | [`contains`](ProcessedStore::contains) | Has this key been processed? |
/// | [`add`](ProcessedStore::add) | Durably record a key |
/// | [`len`](ProcessedStore::len) | Number of known keys |
#[async_trait]
pub trait ProcessedStore: Send + Sync {
    /// Refresh from the backing storage so completions from earlier runs
    /// are respected. Stores without external state do nothing.
    async fn reload(&self) -> Result<()> {
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool>;

    /// Record `key`. Returns `false` if it was already present, in which
    /// case nothing is written.
    async fn add(&self, key: &str) -> Result<bool>;

    async fn len(&self) -> Result<usize>;
}
