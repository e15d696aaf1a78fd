//! Sync pipeline orchestration.
//!
//! Walks the registry's paginated funding feed and, for each record that
//! is not yet processed, runs the award matcher, writes a match back to
//! the registry, and marks the record processed.
//!
//! ```text
//! FETCH_PAGE ─▶ FILTER_UNPROCESSED ─▶ for each record:
//!                                       MATCH ─▶ WRITE_BACK ─▶ MARK_PROCESSED
//!          ▲                                                        │
//!          └──────────────── next cursor? ◀─────────────────────────┘
//! ```
//!
//! A record is marked processed once matching was attempted, whether or not
//! a match was found or the write-back succeeded, so unmatchable records are
//! not rescanned on every run. Failures for one record never abort the run:
//! upstream errors and processed-store lookups or appends that fail are
//! logged and counted, and the walk moves on. Only a processed store that
//! cannot be loaded at startup aborts, before any page is fetched.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use award_sync_core::models::FundingRecord;
use award_sync_core::store::ProcessedStore;

use crate::award_search::AwardSearchClient;
use crate::config::Config;
use crate::error::SyncError;
use crate::findings::FindingsLog;
use crate::matcher::AwardMatcher;
use crate::processed::FileProcessedStore;
use crate::progress::{ProgressMode, SyncProgressEvent, SyncProgressReporter};
use crate::registry::DmpRegistryClient;
use crate::traits::{RegistryPage, RegistrySource};

/// Run-level switches from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Match only: no write-back and nothing marked processed.
    pub dry_run: bool,
    /// Stop after this many match attempts.
    pub limit: Option<usize>,
}

/// Final outcome for one feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    NoFunding,
    Malformed,
    NoDoi,
    AlreadyProcessed,
    UnsupportedFunder,
    /// The processed store could not be consulted; the record is left alone.
    StoreUnavailable,
    Unmatched,
    SearchFailed,
    Written,
    WriteBackFailed,
    DryRunMatched,
}

impl RecordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOutcome::NoFunding => "no_funding",
            RecordOutcome::Malformed => "malformed",
            RecordOutcome::NoDoi => "no_doi",
            RecordOutcome::AlreadyProcessed => "already_processed",
            RecordOutcome::UnsupportedFunder => "unsupported_funder",
            RecordOutcome::StoreUnavailable => "store_unavailable",
            RecordOutcome::Unmatched => "unmatched",
            RecordOutcome::SearchFailed => "search_failed",
            RecordOutcome::Written => "written",
            RecordOutcome::WriteBackFailed => "write_back_failed",
            RecordOutcome::DryRunMatched => "dry_run_matched",
        }
    }

    /// Whether the record counts as processed after this outcome.
    fn marks_processed(&self) -> bool {
        matches!(
            self,
            RecordOutcome::UnsupportedFunder
                | RecordOutcome::Unmatched
                | RecordOutcome::SearchFailed
                | RecordOutcome::Written
                | RecordOutcome::WriteBackFailed
        )
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub pages_fetched: u64,
    pub records_seen: u64,
    pub skipped_no_funding: u64,
    pub skipped_no_doi: u64,
    pub skipped_malformed: u64,
    pub skipped_processed: u64,
    pub unsupported_funder: u64,
    pub match_attempts: u64,
    pub matched: u64,
    pub write_backs_ok: u64,
    pub write_backs_failed: u64,
    pub upstream_errors: u64,
    pub marked_processed: u64,
    /// Processed-store lookups and appends that failed.
    pub store_errors: u64,
    /// The walk ended early on a page error or a repeated cursor.
    pub incomplete: bool,
}

impl SyncStats {
    fn count(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::NoFunding => self.skipped_no_funding += 1,
            RecordOutcome::Malformed => self.skipped_malformed += 1,
            RecordOutcome::NoDoi => self.skipped_no_doi += 1,
            RecordOutcome::AlreadyProcessed => self.skipped_processed += 1,
            RecordOutcome::UnsupportedFunder => self.unsupported_funder += 1,
            RecordOutcome::StoreUnavailable => self.store_errors += 1,
            RecordOutcome::Unmatched => {}
            RecordOutcome::SearchFailed => self.upstream_errors += 1,
            RecordOutcome::Written => {
                self.matched += 1;
                self.write_backs_ok += 1;
            }
            RecordOutcome::WriteBackFailed => {
                self.matched += 1;
                self.write_backs_failed += 1;
            }
            RecordOutcome::DryRunMatched => self.matched += 1,
        }
    }

    pub fn print_summary(&self, dry_run: bool) {
        if dry_run {
            println!("sync (dry-run)");
        } else {
            println!("sync");
        }
        println!("  pages fetched: {}", self.pages_fetched);
        println!("  records seen: {}", self.records_seen);
        println!(
            "  skipped: {} processed, {} no funding, {} no DOI, {} malformed",
            self.skipped_processed,
            self.skipped_no_funding,
            self.skipped_no_doi,
            self.skipped_malformed
        );
        println!("  unsupported funder: {}", self.unsupported_funder);
        println!("  match attempts: {}", self.match_attempts);
        println!("  matched: {}", self.matched);
        if !dry_run {
            println!("  write-backs: {} ok, {} failed", self.write_backs_ok, self.write_backs_failed);
            println!("  marked processed: {}", self.marked_processed);
        }
        println!("  upstream errors: {}", self.upstream_errors);
        if self.store_errors > 0 {
            println!("  processed-store errors: {}", self.store_errors);
        }
        if self.incomplete {
            println!("incomplete");
        } else {
            println!("ok");
        }
    }
}

pub struct SyncPipeline {
    registry: Arc<dyn RegistrySource>,
    matcher: AwardMatcher,
    processed: Arc<dyn ProcessedStore>,
    funder_ids: Vec<String>,
    progress: Box<dyn SyncProgressReporter>,
    options: SyncOptions,
}

impl SyncPipeline {
    /// `funder_ids` lists the funders the award index covers; empty accepts all.
    pub fn new(
        registry: Arc<dyn RegistrySource>,
        matcher: AwardMatcher,
        processed: Arc<dyn ProcessedStore>,
        funder_ids: Vec<String>,
        progress: Box<dyn SyncProgressReporter>,
        options: SyncOptions,
    ) -> Self {
        Self {
            registry,
            matcher,
            processed,
            funder_ids,
            progress,
            options,
        }
    }

    fn supports_funder(&self, funder_id: &str) -> bool {
        self.funder_ids.is_empty() || self.funder_ids.iter().any(|f| f == funder_id)
    }

    fn limit_reached(&self, stats: &SyncStats) -> bool {
        self.options
            .limit
            .is_some_and(|limit| stats.match_attempts >= limit as u64)
    }

    /// Walk the feed from `start_url` until no next cursor remains.
    pub async fn run(&self, start_url: &str) -> Result<SyncStats> {
        self.processed
            .reload()
            .await
            .context("Failed to load processed-record set")?;

        let mut stats = SyncStats::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut cursor = Some(start_url.to_string());

        while let Some(url) = cursor.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(%url, "registry returned an already visited page; stopping");
                stats.incomplete = true;
                break;
            }

            let page = match self.registry.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(%url, error = %e, "failed to fetch registry page");
                    stats.upstream_errors += 1;
                    stats.incomplete = true;
                    break;
                }
            };
            stats.pages_fetched += 1;
            self.progress.report(SyncProgressEvent::PageFetched {
                page: stats.pages_fetched,
                url: url.clone(),
                items: page.items.len() as u64,
            });
            log_page_errors(&url, &page);

            if page.items.is_empty() {
                tracing::debug!(%url, "empty page; walk complete");
                break;
            }

            for item in page.items.iter() {
                if self.limit_reached(&stats) {
                    tracing::info!(limit = ?self.options.limit, "match limit reached; stopping");
                    return Ok(stats);
                }
                stats.records_seen += 1;
                let (update_url, outcome) = self.process_item(item.funding.as_ref(), &mut stats).await;
                stats.count(outcome);
                self.progress.report(SyncProgressEvent::RecordProcessed {
                    n: stats.records_seen,
                    update_url,
                    outcome,
                });
            }

            cursor = page.next_url().map(str::to_string);
        }

        Ok(stats)
    }

    async fn process_item(
        &self,
        funding: Option<&Value>,
        stats: &mut SyncStats,
    ) -> (Option<String>, RecordOutcome) {
        let Some(funding) = funding.filter(|f| !f.is_null()) else {
            return (None, RecordOutcome::NoFunding);
        };
        let record = match FundingRecord::from_value(funding.clone()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed funding record");
                let update_url = funding
                    .get("update_url")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                return (update_url, RecordOutcome::Malformed);
            }
        };
        let update_url = Some(record.update_target.clone());

        if record.doi().is_none() {
            return (update_url, RecordOutcome::NoDoi);
        }
        match self.processed.contains(&record.update_target).await {
            Ok(true) => return (update_url, RecordOutcome::AlreadyProcessed),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    update_url = %record.update_target,
                    error = %e,
                    "processed-set lookup failed; skipping record"
                );
                return (update_url, RecordOutcome::StoreUnavailable);
            }
        }

        let outcome = if !self.supports_funder(&record.funder_id) {
            tracing::info!(
                update_url = %record.update_target,
                funder_id = %record.funder_id,
                "funder not covered by the award index"
            );
            RecordOutcome::UnsupportedFunder
        } else {
            stats.match_attempts += 1;
            self.match_and_write(&record).await
        };

        if !self.options.dry_run && outcome.marks_processed() {
            match self.processed.add(&record.update_target).await {
                Ok(true) => stats.marked_processed += 1,
                Ok(false) => {}
                Err(e) => {
                    // Not fatal: the record is retried on the next run.
                    tracing::error!(
                        update_url = %record.update_target,
                        outcome = outcome.as_str(),
                        error = %e,
                        "failed to mark record processed"
                    );
                    stats.store_errors += 1;
                }
            }
        }
        (update_url, outcome)
    }

    async fn match_and_write(&self, record: &FundingRecord) -> RecordOutcome {
        let award = match self.matcher.find_award(record).await {
            Ok(Some(award)) => award,
            Ok(None) => return RecordOutcome::Unmatched,
            Err(e) => {
                log_upstream_error(record, &e, "award search failed");
                return RecordOutcome::SearchFailed;
            }
        };

        if self.options.dry_run {
            tracing::info!(
                update_url = %record.update_target,
                award_id = %award.award_id,
                "dry run; not writing back"
            );
            return RecordOutcome::DryRunMatched;
        }

        match self.registry.push_award(record, &award).await {
            Ok(location) => {
                tracing::info!(
                    update_url = %record.update_target,
                    location = location.as_deref().unwrap_or("-"),
                    "award written back"
                );
                RecordOutcome::Written
            }
            Err(e) => {
                log_upstream_error(record, &e, "write-back failed");
                RecordOutcome::WriteBackFailed
            }
        }
    }
}

fn log_page_errors(url: &str, page: &RegistryPage) {
    for err in &page.errors {
        tracing::warn!(%url, error = %err, "registry reported page error");
    }
}

fn log_upstream_error(record: &FundingRecord, err: &SyncError, msg: &str) {
    match err {
        SyncError::AuthenticationFailure { .. } => {
            tracing::error!(update_url = %record.update_target, error = %err, "{}", msg)
        }
        SyncError::WriteBackRejected { status, .. } => {
            tracing::warn!(update_url = %record.update_target, status, error = %err, "{}", msg)
        }
        SyncError::UpstreamUnavailable { .. } | SyncError::MalformedResponse { .. } => {
            tracing::warn!(update_url = %record.update_target, error = %err, "{}", msg)
        }
    }
}

/// Build the production pipeline from `config` and run it.
pub async fn run_sync(config: &Config, options: SyncOptions, progress: ProgressMode) -> Result<SyncStats> {
    let processed = FileProcessedStore::open(&config.state.processed_path)?;
    let registry = DmpRegistryClient::new(&config.registry)?;
    let index = AwardSearchClient::new(&config.awards)?;
    let findings = FindingsLog::new(config.state.findings_path.clone());

    let matcher = AwardMatcher::new(Arc::new(index), Arc::new(findings), config);
    let pipeline = SyncPipeline::new(
        Arc::new(registry),
        matcher,
        Arc::new(processed),
        config.matching.funder_ids.clone(),
        progress.reporter(),
        options,
    );

    tracing::info!(
        start = %config.registry.index_url(),
        dry_run = options.dry_run,
        "starting sync"
    );
    pipeline.run(&config.registry.index_url()).await
}
