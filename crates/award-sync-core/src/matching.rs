//! Candidate scoring policy and match selection.
//!
//! Every candidate returned by the award index is scored with
//! [`SimilarityScorer::combined_score`] and sorted by [`MatchPolicy`]:
//!
//! | Score | Treatment |
//! |-------|-----------|
//! | `[borderline_floor, accept_threshold]` | borderline, kept for human review |
//! | `>= accept_threshold` | accepted |
//! | `< borderline_floor` | discarded |
//!
//! The bands overlap at exactly `accept_threshold`: such a candidate is both
//! logged for review and ranked.
//!
//! [`select_match`] then picks the highest-scoring accepted candidate and
//! folds in the investigators of every other accepted candidate sharing its
//! title. Among equal top scores the first candidate in index order wins.

use crate::models::{
    AwardCandidate, AwardIdentifiers, FundingRecord, Investigator, MatchResult, ProgramOfficer,
    RawAward, ScoredCandidate,
};
use crate::similarity::SimilarityScorer;

/// Default lower bound of the borderline band.
pub const DEFAULT_BORDERLINE_FLOOR: f64 = 0.5;
/// Default score at or above which a candidate is accepted.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.64;
/// Base URL used to build a human-facing award link from the index id.
pub const DEFAULT_SHOW_AWARD_URL: &str = "https://www.nsf.gov/awardsearch/showAward?AWD_ID=";

/// Score thresholds for accepting and flagging candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    pub borderline_floor: f64,
    pub accept_threshold: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            borderline_floor: DEFAULT_BORDERLINE_FLOOR,
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }
}

impl MatchPolicy {
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.accept_threshold
    }

    /// Inclusive at both ends.
    pub fn is_borderline(&self, score: f64) -> bool {
        score >= self.borderline_floor && score <= self.accept_threshold
    }
}

/// Scored and classified candidates for one funding record.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Accepted candidates, in index order.
    pub accepted: Vec<ScoredCandidate>,
    /// Borderline candidates, in index order. A candidate scoring exactly
    /// the accept threshold is also in `accepted`.
    pub borderline: Vec<ScoredCandidate>,
    /// Candidates dropped for lacking a title or investigator name.
    pub incomplete: usize,
    /// Candidates scored below the borderline floor.
    pub discarded: usize,
}

/// Score every raw award against `funding` and sort them into bands.
pub fn evaluate(
    funding: &FundingRecord,
    awards: &[RawAward],
    scorer: &SimilarityScorer,
    policy: &MatchPolicy,
) -> Evaluation {
    let mut eval = Evaluation::default();

    for raw in awards {
        let candidate = match AwardCandidate::try_from(raw.clone()) {
            Ok(c) => c,
            Err(_) => {
                eval.incomplete += 1;
                continue;
            }
        };

        let score = scorer.combined_score(
            funding,
            &candidate.title,
            &candidate.investigator_name,
            candidate.organization.as_deref(),
        );
        let scored = ScoredCandidate { candidate, score };

        match (policy.accepts(score), policy.is_borderline(score)) {
            (true, true) => {
                eval.borderline.push(scored.clone());
                eval.accepted.push(scored);
            }
            (true, false) => eval.accepted.push(scored),
            (false, true) => eval.borderline.push(scored),
            (false, false) => eval.discarded += 1,
        }
    }

    eval
}

/// Pick the winning award from the accepted candidates.
///
/// Returns `None` when nothing was accepted. Dates, abstract, program
/// officer, and identifiers come from the top-scoring candidate; the
/// investigator list covers every accepted candidate with the winning title.
pub fn select_match(accepted: &[ScoredCandidate], show_award_url: &str) -> Option<MatchResult> {
    let top = accepted.iter().fold(None::<&ScoredCandidate>, |best, sc| match best {
        Some(b) if sc.score <= b.score => Some(b),
        _ => Some(sc),
    })?;
    let winner = &top.candidate;

    let principal_investigators = accepted
        .iter()
        .filter(|sc| sc.candidate.title == winner.title)
        .map(|sc| Investigator {
            name: sc.candidate.investigator_name.clone(),
            email: sc.candidate.investigator_email.clone(),
            organization: sc.candidate.organization.clone(),
        })
        .collect();

    Some(MatchResult {
        title: winner.title.clone(),
        description: winner.abstract_text.clone(),
        project_start: winner.project_start,
        project_end: winner.project_end,
        principal_investigators,
        program_officer: ProgramOfficer {
            name: winner.program_officer_name.clone(),
            email: winner.program_officer_email.clone(),
            organization: winner.program_officer_org_code.clone(),
        },
        award_id: format!("{}{}", show_award_url, winner.external_id),
        identifiers: AwardIdentifiers {
            fund_program: winner.fund_program_name.clone(),
            primary_program: winner.primary_program.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn funding(title: &str, authors: &[&str]) -> FundingRecord {
        FundingRecord::from_value(json!({
            "projectTitle": title,
            "authors": authors,
            "funderId": "http://dx.doi.org/10.13039/100000001",
            "dmpDOI": "10.80030/test",
            "update_url": "http://registry/api/v0/awards/1"
        }))
        .unwrap()
    }

    fn award(id: &str, title: &str, pi: &str, org: &str) -> RawAward {
        RawAward {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            pd_pi_name: Some(pi.to_string()),
            awardee_name: Some(org.to_string()),
            ..Default::default()
        }
    }

    fn scored(id: &str, title: &str, pi: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: AwardCandidate::try_from(award(id, title, pi, "UCSD")).unwrap(),
            score,
        }
    }

    #[test]
    fn policy_bands() {
        let policy = MatchPolicy::default();
        assert!(!policy.accepts(0.49) && !policy.is_borderline(0.49));
        assert!(!policy.accepts(0.5) && policy.is_borderline(0.5));
        assert!(!policy.accepts(0.6) && policy.is_borderline(0.6));
        assert!(policy.accepts(0.64) && policy.is_borderline(0.64));
        assert!(policy.accepts(2.7) && !policy.is_borderline(2.7));
    }

    #[test]
    fn score_at_accept_threshold_is_both_ranked_and_borderline() {
        // 1 - 9/25 = 0.64
        let f = funding("abcdefghijklmnopqrstuvwxy", &[]);
        let awards = vec![award("7", "abcdefghijklmnopZZZZZZZZZ", "Jane Roe", "UCSD")];
        let eval = evaluate(&f, &awards, &SimilarityScorer::default(), &MatchPolicy::default());

        assert_eq!(eval.accepted.len(), 1);
        assert_eq!(eval.borderline.len(), 1);
        assert_eq!(eval.accepted[0].score, 0.64);
        assert_eq!(eval.discarded, 0);
    }

    #[test]
    fn evaluate_sorts_into_bands_and_skips_incomplete() {
        let f = funding("Alpha", &[]);
        let awards = vec![
            award("1", "Alpha", "Jane Roe", "UCSD"),
            award("2", "Alpxy", "John Doe", "MIT"),
            award("3", "Zzzzzzzz", "Max Mustermann", "TUM"),
            RawAward {
                id: Some("4".into()),
                title: Some("Alpha".into()),
                ..Default::default()
            },
        ];
        let eval = evaluate(&f, &awards, &SimilarityScorer::default(), &MatchPolicy::default());

        assert_eq!(eval.accepted.len(), 1);
        assert_eq!(eval.accepted[0].candidate.external_id, "1");
        assert_eq!(eval.borderline.len(), 1);
        assert_eq!(eval.borderline[0].score, 0.6);
        assert_eq!(eval.discarded, 1);
        assert_eq!(eval.incomplete, 1);
    }

    #[test]
    fn select_empty_is_none() {
        assert!(select_match(&[], DEFAULT_SHOW_AWARD_URL).is_none());
    }

    #[test]
    fn select_highest_and_aggregate_same_title() {
        let accepted = vec![
            scored("10", "Coral Reefs", "Jane Roe", 0.9),
            scored("11", "Coral Reef Survey", "Ann Lee", 1.2),
            scored("12", "Coral Reef Survey", "Bob Ray", 0.7),
        ];
        let m = select_match(&accepted, DEFAULT_SHOW_AWARD_URL).unwrap();
        assert_eq!(m.title, "Coral Reef Survey");
        assert_eq!(
            m.award_id,
            "https://www.nsf.gov/awardsearch/showAward?AWD_ID=11"
        );
        let names: Vec<&str> = m
            .principal_investigators
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ann Lee", "Bob Ray"]);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let accepted = vec![
            scored("20", "First", "Jane Roe", 1.0),
            scored("21", "Second", "Ann Lee", 1.0),
        ];
        let m = select_match(&accepted, "https://awards/").unwrap();
        assert_eq!(m.title, "First");
        assert_eq!(m.award_id, "https://awards/20");
    }

    #[test]
    fn details_come_from_top_candidate() {
        let mut top = scored("30", "Coral", "Jane Roe", 1.5);
        top.candidate.abstract_text = Some("Reefs.".into());
        top.candidate.project_start = NaiveDate::from_ymd_opt(2020, 1, 1);
        top.candidate.program_officer_name = Some("Pat Officer".into());
        top.candidate.fund_program_name = Some("BIO OCE".into());
        let mut other = scored("31", "Coral", "Ann Lee", 0.8);
        other.candidate.abstract_text = Some("Other abstract".into());

        let m = select_match(&[other, top], DEFAULT_SHOW_AWARD_URL).unwrap();
        assert_eq!(m.description.as_deref(), Some("Reefs."));
        assert_eq!(m.project_start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(m.program_officer.name.as_deref(), Some("Pat Officer"));
        assert_eq!(m.program_officer.organization, "4900");
        assert_eq!(m.identifiers.fund_program.as_deref(), Some("BIO OCE"));
        assert_eq!(m.principal_investigators.len(), 2);
        assert!(m.award_id.ends_with("=30"));
    }
}
