//! DMP registry client.
//!
//! Pulls the paginated funding feed and writes matched awards back to each
//! record's `update_url`. Every request carries the client-credentials
//! token from [`TokenProvider`]; a 401 drops the cached token so the next
//! call authenticates again.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use award_sync_core::models::{FundingRecord, MatchResult};

use crate::auth::TokenProvider;
use crate::config::RegistryConfig;
use crate::error::{truncate, Result, Service, SyncError};
use crate::traits::{RegistryPage, RegistrySource};

const NSF_AGENCY_CODE: &str = "4900";

/// Display name of the agency behind a program officer's agency code.
pub fn agency_name(code: &str) -> &'static str {
    if code == NSF_AGENCY_CODE {
        "National Science Foundation (NSF)"
    } else {
        "National Aeronautics and Space Administration (NASA)"
    }
}

/// Build the write-back document for a matched award.
///
/// The DMP DOI is echoed so the registry can confirm the target record.
pub fn award_payload(record: &FundingRecord, award: &MatchResult) -> Value {
    let mut staff: Vec<Value> = award
        .principal_investigators
        .iter()
        .map(|pi| {
            json!({
                "name": pi.name,
                "mbox": pi.email,
                "contributor_type": "investigator",
                "organizations": [{ "name": pi.organization }],
            })
        })
        .collect();

    let po = &award.program_officer;
    if let Some(name) = &po.name {
        staff.push(json!({
            "name": name,
            "mbox": po.email,
            "contributor_type": "program_officer",
            "organizations": [{ "name": agency_name(&po.organization) }],
        }));
    }

    let mut award_ids = Vec::new();
    if let Some(fund) = &award.identifiers.fund_program {
        award_ids.push(json!({ "category": "sub_program", "value": fund }));
    }
    if let Some(primary) = &award.identifiers.primary_program {
        award_ids.push(json!({ "category": "program", "value": primary }));
    }

    json!({
        "dmp": {
            "dmp_ids": [{ "category": "doi", "value": record.doi() }],
            "dm_staff": staff,
            "project": {
                "start_on": award.project_start,
                "end_on": award.project_end,
                "funding": [{
                    "funder_id": record.funder_id,
                    "grant_id": award.award_id,
                    "funding_status": "granted",
                    "award_ids": award_ids,
                }],
            },
        }
    })
}

/// `reqwest`-backed [`RegistrySource`].
pub struct DmpRegistryClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    user_agent: String,
}

impl DmpRegistryClient {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("Failed to build registry HTTP client")?;

        let tokens = TokenProvider::new(
            http.clone(),
            config.token_url(),
            config.client_id.clone(),
            config.resolve_client_secret()?,
            config.user_agent.clone(),
        );

        Ok(Self {
            http,
            tokens,
            user_agent: format!("{} ({})", config.user_agent, config.client_id),
        })
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        Ok(self
            .http
            .request(method, url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, token.authorization()))
    }

    async fn note_unauthorized(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("registry rejected access token; will re-authenticate");
            self.tokens.invalidate().await;
        }
    }
}

#[async_trait]
impl RegistrySource for DmpRegistryClient {
    async fn fetch_page(&self, url: &str) -> Result<RegistryPage> {
        let resp = self
            .request(Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| SyncError::transport(Service::Registry, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::transport(Service::Registry, e))?;

        if !status.is_success() {
            self.note_unauthorized(status).await;
            return Err(SyncError::status(Service::Registry, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| SyncError::malformed(Service::Registry, e))
    }

    async fn push_award(
        &self,
        record: &FundingRecord,
        award: &MatchResult,
    ) -> Result<Option<String>> {
        let target = &record.update_target;
        let resp = self
            .request(Method::PUT, target)
            .await?
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&award_payload(record, award))
            .send()
            .await
            .map_err(|e| SyncError::transport(Service::Registry, e))?;

        let status = resp.status();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(location),
            _ => {
                self.note_unauthorized(status).await;
                let body = resp.text().await.unwrap_or_default();
                Err(SyncError::WriteBackRejected {
                    target: target.clone(),
                    status: status.as_u16(),
                    body: truncate(&body, 500),
                })
            }
        }
    }
}
