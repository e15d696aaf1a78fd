mod common;

use std::sync::Arc;

use award_sync::error::SyncError;
use common::{award, funding, matcher, FakeIndex, VecFindings};
use serde_json::json;

#[tokio::test]
async fn selects_exact_title_over_unrelated_candidate() {
    let index = Arc::new(FakeIndex::with_awards(json!([
        award("1001", "Research on Coral Reefs", "Jane Roe"),
        award("1002", "Unrelated Chemistry Study", "John Doe"),
    ])));
    let findings = Arc::new(VecFindings::default());
    let matcher = matcher(index.clone(), findings.clone());

    let result = matcher
        .find_award(&funding("Research on Coral Reefs", "http://r/1"))
        .await
        .unwrap()
        .expect("expected a match");

    assert_eq!(result.title, "Research on Coral Reefs");
    assert!(result.award_id.ends_with("AWD_ID=1001"));
    assert_eq!(result.principal_investigators.len(), 1);
    assert_eq!(result.principal_investigators[0].name, "Jane Roe");
    assert!(findings.entries().is_empty());

    let queries = index.queries.lock().unwrap().clone();
    assert_eq!(queries, vec![vec!["Research", "Coral", "Reefs"]]);
}

#[tokio::test]
async fn borderline_candidate_goes_to_findings_not_result() {
    let index = Arc::new(FakeIndex::with_awards(json!([award("2001", "Alpxy", "Jane Roe")])));
    let findings = Arc::new(VecFindings::default());
    let matcher = matcher(index, findings.clone());

    let result = matcher
        .find_award(&funding("Alpha", "http://r/2"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(findings.entries(), vec![("http://r/2".to_string(), 0.6)]);
}

#[tokio::test]
async fn score_at_accept_threshold_is_logged_and_matched() {
    // 1 - 9/25 = 0.64
    let index = Arc::new(FakeIndex::with_awards(json!([award(
        "2101",
        "abcdefghijklmnopZZZZZZZZZ",
        "Jane Roe"
    )])));
    let findings = Arc::new(VecFindings::default());
    let matcher = matcher(index, findings.clone());

    let result = matcher
        .find_award(&funding("abcdefghijklmnopqrstuvwxy", "http://r/21"))
        .await
        .unwrap()
        .expect("expected a match at the accept threshold");

    assert!(result.award_id.ends_with("AWD_ID=2101"));
    assert_eq!(findings.entries(), vec![("http://r/21".to_string(), 0.64)]);
}

#[tokio::test]
async fn borderline_is_logged_alongside_an_accepted_match() {
    let index = Arc::new(FakeIndex::with_awards(json!([
        award("3001", "Alpxy", "John Doe"),
        award("3002", "Alpha", "Jane Roe"),
    ])));
    let findings = Arc::new(VecFindings::default());
    let matcher = matcher(index, findings.clone());

    let result = matcher
        .find_award(&funding("Alpha", "http://r/3"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.title, "Alpha");
    assert!(result
        .principal_investigators
        .iter()
        .all(|pi| pi.name != "John Doe"));
    assert_eq!(findings.entries().len(), 1);
}

#[tokio::test]
async fn candidates_without_pi_are_ignored() {
    let index = Arc::new(FakeIndex::with_awards(json!([
        { "id": "4001", "title": "Research on Coral Reefs" }
    ])));
    let matcher = matcher(index, Arc::new(VecFindings::default()));

    let result = matcher
        .find_award(&funding("Research on Coral Reefs", "http://r/4"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn missing_title_skips_search() {
    let index = Arc::new(FakeIndex::with_awards(json!([])));
    let matcher = matcher(index.clone(), Arc::new(VecFindings::default()));

    let mut record = funding("placeholder", "http://r/5");
    record.project_title = None;

    assert!(matcher.find_award(&record).await.unwrap().is_none());
    assert_eq!(index.query_count(), 0);
}

#[tokio::test]
async fn search_failure_is_returned() {
    let index = Arc::new(FakeIndex::failing());
    let matcher = matcher(index, Arc::new(VecFindings::default()));

    let err = matcher
        .find_award(&funding("Research on Coral Reefs", "http://r/6"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UpstreamUnavailable { .. }));
}
