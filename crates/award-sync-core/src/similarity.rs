//! Similarity scoring between funding records and award candidates.
//!
//! # Combined score
//!
//! 1. `title = similarity(normalize(funding.title), normalize(candidate.title))`.
//! 2. No authors on the funding record, or none that parse to a name or an
//!    organization: return `title`.
//! 3. `title` below the author trust threshold: return `title`. Author and
//!    organization agreement on a weak title match is noise.
//! 4. Otherwise return `title + Σ similarity(name_i, pi) + Σ similarity(org_i, awardee)`.
//!
//! The sum is unbounded above 1.0. It is only ever compared against other
//! candidates' scores and the acceptance thresholds, never read as a probability.

use crate::models::FundingRecord;
use crate::normalize::normalize_title;

/// Default title score below which author/organization signal is ignored.
pub const DEFAULT_AUTHOR_TRUST_THRESHOLD: f64 = 0.7;

/// Normalized Levenshtein similarity in `[0, 1]`.
///
/// Returns `None` when either side is absent. Two empty strings are
/// identical and score `1.0`.
pub fn similarity(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    Some(strsim::normalized_levenshtein(a?, b?))
}

/// Combines title, investigator, and organization similarity into one score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    pub author_trust_threshold: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self {
            author_trust_threshold: DEFAULT_AUTHOR_TRUST_THRESHOLD,
        }
    }
}

impl SimilarityScorer {
    pub fn new(author_trust_threshold: f64) -> Self {
        Self {
            author_trust_threshold,
        }
    }

    /// Title-only similarity after normalizing both sides.
    pub fn title_score(&self, funding_title: Option<&str>, candidate_title: &str) -> f64 {
        let a = funding_title.map(normalize_title);
        let b = normalize_title(candidate_title);
        similarity(a.as_deref(), Some(&b)).unwrap_or(0.0)
    }

    /// Score one candidate against a funding record.
    pub fn combined_score(
        &self,
        funding: &FundingRecord,
        candidate_title: &str,
        candidate_investigator: &str,
        candidate_org: Option<&str>,
    ) -> f64 {
        let title_score = self.title_score(funding.title(), candidate_title);
        if funding.authors.is_empty() {
            return title_score;
        }

        let authors = funding.parsed_authors();
        let names: Vec<&str> = authors.iter().filter_map(|a| a.name.as_deref()).collect();
        let orgs: Vec<&str> = authors
            .iter()
            .filter_map(|a| a.organization.as_deref())
            .collect();

        if (names.is_empty() && orgs.is_empty()) || title_score < self.author_trust_threshold {
            return title_score;
        }

        let org_score: f64 = orgs
            .iter()
            .filter_map(|org| similarity(Some(org), candidate_org))
            .sum();
        let author_score: f64 = names
            .iter()
            .filter_map(|name| similarity(Some(name), Some(candidate_investigator)))
            .sum();

        title_score + author_score + org_score
    }
}
