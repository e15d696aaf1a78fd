//! Seams between the sync pipeline and the outside world.
//!
//! The pipeline and matcher only talk to upstream services through these
//! traits, so tests drive them with in-memory fakes and the binary wires in
//! the `reqwest`-backed clients.
//!
//! ```text
//!   RegistrySource ──fetch_page──▶ SyncPipeline ──push_award──▶ RegistrySource
//!                                      │
//!                                      ▼
//!                                 AwardMatcher ──search──▶ AwardIndex
//!                                      │
//!                                      ▼
//!                                 FindingsSink (borderline candidates)
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use award_sync_core::models::{FundingRecord, MatchResult, RawAward};

use crate::error::Result;

/// One page of the registry's funding feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<RegistryItem>,
    /// URL of the next page. Absent or blank ends the walk.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<Value>,
}

impl RegistryPage {
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// A feed item. Only the funding block is interpreted; it stays raw JSON
/// until the pipeline validates it into a [`FundingRecord`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryItem {
    #[serde(default)]
    pub funding: Option<Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The system of record for funding records.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Fetch one page of the feed.
    async fn fetch_page(&self, url: &str) -> Result<RegistryPage>;

    /// Write a matched award back to `record.update_target`.
    ///
    /// Returns the `Location` the registry reported, if any.
    async fn push_award(&self, record: &FundingRecord, award: &MatchResult)
        -> Result<Option<String>>;
}

/// Response of one award search: typed awards plus the body as received.
#[derive(Debug, Clone, Default)]
pub struct AwardSearchResponse {
    pub raw: Value,
    pub awards: Vec<RawAward>,
    /// Elements of the award array that could not be read at all.
    pub unreadable: usize,
}

/// An external grants-search index.
#[async_trait]
pub trait AwardIndex: Send + Sync {
    /// Search by title keywords. An empty result is `Ok`.
    async fn search(&self, keywords: &[String]) -> Result<AwardSearchResponse>;
}

/// A borderline candidate kept for human review.
#[derive(Debug, Clone, Copy)]
pub struct Finding<'a> {
    pub funding: &'a FundingRecord,
    pub response: &'a Value,
    pub score: f64,
}

/// Append-only destination for borderline findings.
#[async_trait]
pub trait FindingsSink: Send + Sync {
    async fn record(&self, finding: &Finding<'_>) -> anyhow::Result<()>;
}
