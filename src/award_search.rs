//! Client for a grants-search index (NSF Award Search API shape).
//!
//! One GET per query: `keyword` carries the normalized title tokens and
//! `printFields` the fixed field selection. Awards are read from
//! `response.award` one element at a time, so one unreadable award does not
//! hide the rest; the full body is kept for the findings log.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use award_sync_core::models::RawAward;

use crate::config::AwardsConfig;
use crate::error::{Result, Service, SyncError};
use crate::traits::{AwardIndex, AwardSearchResponse};

pub struct AwardSearchClient {
    http: reqwest::Client,
    search_url: String,
    print_fields: String,
    user_agent: String,
}

impl AwardSearchClient {
    pub fn new(config: &AwardsConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("Failed to build award search HTTP client")?;

        Ok(Self {
            http,
            search_url: config.search_url(),
            print_fields: config.print_fields.join(","),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Pull `response.award` out of a search body.
///
/// A missing array is an empty result and a non-array is malformed. Elements
/// that do not deserialize are skipped and counted in the second value.
fn parse_awards(raw: &Value) -> Result<(Vec<RawAward>, usize)> {
    let elements = match raw.pointer("/response/award") {
        None | Some(Value::Null) => return Ok((Vec::new(), 0)),
        Some(Value::Array(elements)) => elements,
        Some(_) => {
            return Err(SyncError::malformed(
                Service::AwardSearch,
                "`response.award` is not an array",
            ))
        }
    };

    let mut awards = Vec::with_capacity(elements.len());
    let mut unreadable = 0;
    for (position, element) in elements.iter().enumerate() {
        match RawAward::deserialize(element) {
            Ok(award) => awards.push(award),
            Err(e) => {
                tracing::warn!(position, error = %e, "skipping unreadable award");
                unreadable += 1;
            }
        }
    }
    Ok((awards, unreadable))
}

#[async_trait]
impl AwardIndex for AwardSearchClient {
    async fn search(&self, keywords: &[String]) -> Result<AwardSearchResponse> {
        let keyword = keywords.join(" ");
        tracing::debug!(%keyword, "searching award index");

        let resp = self
            .http
            .get(&self.search_url)
            .query(&[
                ("keyword", keyword.as_str()),
                ("printFields", self.print_fields.as_str()),
            ])
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| SyncError::transport(Service::AwardSearch, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::transport(Service::AwardSearch, e))?;

        if !status.is_success() {
            return Err(SyncError::status(Service::AwardSearch, status, &body));
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|e| SyncError::malformed(Service::AwardSearch, e))?;
        let (awards, unreadable) = parse_awards(&raw)?;

        Ok(AwardSearchResponse {
            raw,
            awards,
            unreadable,
        })
    }
}
