//! In-memory fakes for the upstream seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use award_sync::error::{Result, Service, SyncError};
use award_sync::matcher::AwardMatcher;
use award_sync::traits::{
    AwardIndex, AwardSearchResponse, Finding, FindingsSink, RegistryPage, RegistrySource,
};
use award_sync_core::matching::{MatchPolicy, DEFAULT_SHOW_AWARD_URL};
use award_sync_core::models::{FundingRecord, MatchResult};
use award_sync_core::similarity::SimilarityScorer;
use award_sync_core::store::memory::InMemoryProcessedStore;
use award_sync_core::store::ProcessedStore;

pub const NSF: &str = "http://dx.doi.org/10.13039/100000001";

/// Registry serving pages from a map and recording every call.
#[derive(Default)]
pub struct FakeRegistry {
    pages: HashMap<String, Value>,
    reject_pushes: bool,
    pub fetched: Mutex<Vec<String>>,
    pub pushes: Mutex<Vec<(String, MatchResult)>>,
}

impl FakeRegistry {
    pub fn new(pages: Vec<(&str, Value)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, body)| (url.to_string(), body))
                .collect(),
            ..Default::default()
        }
    }

    pub fn rejecting_pushes(mut self) -> Self {
        self.reject_pushes = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn pushed_targets(&self) -> Vec<String> {
        self.pushes
            .lock()
            .unwrap()
            .iter()
            .map(|(target, _)| target.clone())
            .collect()
    }
}

#[async_trait]
impl RegistrySource for FakeRegistry {
    async fn fetch_page(&self, url: &str) -> Result<RegistryPage> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => serde_json::from_value(body.clone())
                .map_err(|e| SyncError::malformed(Service::Registry, e)),
            None => Err(SyncError::UpstreamUnavailable {
                service: Service::Registry,
                status: Some(404),
                detail: format!("no page at {}", url),
            }),
        }
    }

    async fn push_award(
        &self,
        record: &FundingRecord,
        award: &MatchResult,
    ) -> Result<Option<String>> {
        self.pushes
            .lock()
            .unwrap()
            .push((record.update_target.clone(), award.clone()));
        if self.reject_pushes {
            return Err(SyncError::WriteBackRejected {
                target: record.update_target.clone(),
                status: 422,
                body: "rejected".into(),
            });
        }
        Ok(None)
    }
}

/// Award index answering every query with the same body.
pub struct FakeIndex {
    body: Option<Value>,
    pub queries: Mutex<Vec<Vec<String>>>,
}

impl FakeIndex {
    pub fn with_awards(awards: Value) -> Self {
        Self {
            body: Some(json!({ "response": { "award": awards } })),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl AwardIndex for FakeIndex {
    async fn search(&self, keywords: &[String]) -> Result<AwardSearchResponse> {
        self.queries.lock().unwrap().push(keywords.to_vec());
        let Some(raw) = self.body.clone() else {
            return Err(SyncError::UpstreamUnavailable {
                service: Service::AwardSearch,
                status: Some(503),
                detail: "unavailable".into(),
            });
        };
        let awards = serde_json::from_value(raw["response"]["award"].clone())
            .map_err(|e| SyncError::malformed(Service::AwardSearch, e))?;
        Ok(AwardSearchResponse {
            raw,
            awards,
            ..AwardSearchResponse::default()
        })
    }
}

/// Processed store whose operations can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryProcessedStore,
    fail_reload: bool,
    fail_contains: bool,
    fail_add: bool,
}

impl FlakyStore {
    pub fn failing_reload() -> Self {
        Self {
            fail_reload: true,
            ..Default::default()
        }
    }

    pub fn failing_contains() -> Self {
        Self {
            fail_contains: true,
            ..Default::default()
        }
    }

    pub fn failing_add() -> Self {
        Self {
            fail_add: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProcessedStore for FlakyStore {
    async fn reload(&self) -> anyhow::Result<()> {
        if self.fail_reload {
            anyhow::bail!("processed set unreadable");
        }
        self.inner.reload().await
    }

    async fn contains(&self, key: &str) -> anyhow::Result<bool> {
        if self.fail_contains {
            anyhow::bail!("processed set unreadable");
        }
        self.inner.contains(key).await
    }

    async fn add(&self, key: &str) -> anyhow::Result<bool> {
        if self.fail_add {
            anyhow::bail!("disk full");
        }
        self.inner.add(key).await
    }

    async fn len(&self) -> anyhow::Result<usize> {
        self.inner.len().await
    }
}

/// Findings sink keeping (update_url, score) pairs.
#[derive(Default)]
pub struct VecFindings {
    pub entries: Mutex<Vec<(String, f64)>>,
}

impl VecFindings {
    pub fn entries(&self) -> Vec<(String, f64)> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl FindingsSink for VecFindings {
    async fn record(&self, finding: &Finding<'_>) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .push((finding.funding.update_target.clone(), finding.score));
        Ok(())
    }
}

pub fn matcher(index: Arc<FakeIndex>, findings: Arc<VecFindings>) -> AwardMatcher {
    AwardMatcher::with_policy(
        index,
        findings,
        SimilarityScorer::default(),
        MatchPolicy::default(),
        DEFAULT_SHOW_AWARD_URL,
    )
}

pub fn funding_json(title: &str, update_url: &str) -> Value {
    json!({
        "projectTitle": title,
        "authors": [],
        "funderId": NSF,
        "dmpDOI": "10.80030/test",
        "update_url": update_url
    })
}

pub fn funding(title: &str, update_url: &str) -> FundingRecord {
    FundingRecord::from_value(funding_json(title, update_url)).unwrap()
}

pub fn award(id: &str, title: &str, pi: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "pdPIName": pi,
        "piEmail": "pi@example.edu",
        "awardeeName": "Example University",
        "startDate": "09/01/2019",
        "expDate": "08/31/2022",
        "poName": "Pat Officer"
    })
}
