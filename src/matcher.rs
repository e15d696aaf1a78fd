//! Award matching for a single funding record.
//!
//! Searches the award index with the record's normalized title keywords,
//! scores every candidate with the core scorer, hands borderline candidates
//! to the findings sink, and selects the winning award from the accepted
//! ones.

use std::sync::Arc;

use award_sync_core::matching::{evaluate, select_match, MatchPolicy};
use award_sync_core::models::{FundingRecord, MatchResult};
use award_sync_core::normalize::title_keywords;
use award_sync_core::similarity::SimilarityScorer;

use crate::config::Config;
use crate::error::Result;
use crate::traits::{AwardIndex, Finding, FindingsSink};

pub struct AwardMatcher {
    index: Arc<dyn AwardIndex>,
    findings: Arc<dyn FindingsSink>,
    scorer: SimilarityScorer,
    policy: MatchPolicy,
    show_award_url: String,
}

impl AwardMatcher {
    pub fn new(
        index: Arc<dyn AwardIndex>,
        findings: Arc<dyn FindingsSink>,
        config: &Config,
    ) -> Self {
        Self::with_policy(
            index,
            findings,
            config.matching.scorer(),
            config.matching.policy(),
            config.awards.show_award_url.clone(),
        )
    }

    pub fn with_policy(
        index: Arc<dyn AwardIndex>,
        findings: Arc<dyn FindingsSink>,
        scorer: SimilarityScorer,
        policy: MatchPolicy,
        show_award_url: impl Into<String>,
    ) -> Self {
        Self {
            index,
            findings,
            scorer,
            policy,
            show_award_url: show_award_url.into(),
        }
    }

    /// Find the award for `funding`.
    ///
    /// `Ok(None)` means nothing scored high enough, including when the
    /// record has no title to search by. Search failures are returned to the
    /// caller unretried.
    pub async fn find_award(&self, funding: &FundingRecord) -> Result<Option<MatchResult>> {
        let Some(title) = funding.title() else {
            tracing::debug!(update_url = %funding.update_target, "no project title; not searching");
            return Ok(None);
        };
        let keywords = title_keywords(title);
        if keywords.is_empty() {
            tracing::debug!(update_url = %funding.update_target, "title has no searchable keywords");
            return Ok(None);
        }

        let response = self.index.search(&keywords).await?;
        let eval = evaluate(funding, &response.awards, &self.scorer, &self.policy);

        tracing::debug!(
            update_url = %funding.update_target,
            candidates = response.awards.len(),
            accepted = eval.accepted.len(),
            borderline = eval.borderline.len(),
            incomplete = eval.incomplete + response.unreadable,
            discarded = eval.discarded,
            "scored award candidates"
        );

        for scored in &eval.borderline {
            let finding = Finding {
                funding,
                response: &response.raw,
                score: scored.score,
            };
            if let Err(e) = self.findings.record(&finding).await {
                tracing::warn!(error = %e, "failed to record borderline finding");
            }
        }

        let result = select_match(&eval.accepted, &self.show_award_url);
        if let Some(m) = &result {
            tracing::info!(
                update_url = %funding.update_target,
                title = %m.title,
                award_id = %m.award_id,
                "matched award"
            );
        }
        Ok(result)
    }
}
