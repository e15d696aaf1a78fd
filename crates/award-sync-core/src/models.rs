//! Core data models used throughout award-sync.
//!
//! [`FundingRecord`]s come from the DMP registry, [`AwardCandidate`]s from the
//! grants-search index. Both are built from raw JSON at the boundary and
//! reject payloads that lack a required field instead of defaulting it.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Agency code assumed for a program officer when the index omits one (NSF).
pub const DEFAULT_AGENCY_CODE: &str = "4900";

/// Reasons a raw payload cannot be turned into a typed record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The funding block of a registry item.
///
/// Identity is [`update_target`](FundingRecord::update_target), the URL the
/// registry accepts write-backs on. Fields the engine does not interpret are
/// kept in `extra` so the record serializes back to the shape the registry
/// sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRecord {
    #[serde(rename = "projectTitle", default)]
    pub project_title: Option<String>,
    /// `"name|organization"` entries, in registry order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub authors: Vec<String>,
    #[serde(rename = "funderId")]
    pub funder_id: String,
    #[serde(rename = "dmpDOI", default)]
    pub dmp_doi: Option<String>,
    #[serde(rename = "update_url")]
    pub update_target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

impl FundingRecord {
    /// Build a record from the registry's raw funding JSON.
    ///
    /// `funderId` and `update_url` must be present and non-blank.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        for field in ["funderId", "update_url"] {
            let present = value
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(RecordError::MissingField(field));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The project title, if present and not blank.
    pub fn title(&self) -> Option<&str> {
        self.project_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// The DMP DOI, if present and not blank.
    pub fn doi(&self) -> Option<&str> {
        self.dmp_doi.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Parse every author entry into name and organization.
    pub fn parsed_authors(&self) -> Vec<Author> {
        self.authors.iter().map(|a| Author::parse(a)).collect()
    }
}

/// One author entry of a funding record, split on the pipe delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub organization: Option<String>,
}

impl Author {
    /// Parse `"name|organization"`. An entry without a pipe is a bare name.
    pub fn parse(entry: &str) -> Self {
        let (name, organization) = match entry.split_once('|') {
            Some((name, org)) => (name, Some(org)),
            None => (entry, None),
        };
        Self {
            name: non_blank(name),
            organization: organization.and_then(non_blank),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// An award exactly as the search index returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAward {
    /// Sent as a string by most index versions, as a number by some.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "pdPIName", default)]
    pub pd_pi_name: Option<String>,
    #[serde(rename = "piEmail", default)]
    pub pi_email: Option<String>,
    #[serde(rename = "awardeeName", default)]
    pub awardee_name: Option<String>,
    #[serde(rename = "abstractText", default)]
    pub abstract_text: Option<String>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "expDate", default)]
    pub exp_date: Option<String>,
    #[serde(rename = "poName", default)]
    pub po_name: Option<String>,
    #[serde(rename = "poEmail", default)]
    pub po_email: Option<String>,
    #[serde(rename = "awardAgencyCode", default)]
    pub award_agency_code: Option<String>,
    #[serde(rename = "fundProgramName", default)]
    pub fund_program_name: Option<String>,
    #[serde(rename = "primaryProgram", default)]
    pub primary_program: Option<String>,
}

/// A typed award candidate. Title and principal investigator are required.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardCandidate {
    pub title: String,
    pub investigator_name: String,
    pub investigator_email: Option<String>,
    pub organization: Option<String>,
    pub abstract_text: Option<String>,
    pub project_start: Option<NaiveDate>,
    pub project_end: Option<NaiveDate>,
    pub program_officer_name: Option<String>,
    pub program_officer_email: Option<String>,
    pub program_officer_org_code: String,
    pub fund_program_name: Option<String>,
    pub primary_program: Option<String>,
    pub external_id: String,
}

impl TryFrom<RawAward> for AwardCandidate {
    type Error = RecordError;

    fn try_from(raw: RawAward) -> Result<Self, Self::Error> {
        let title = raw
            .title
            .as_deref()
            .and_then(non_blank)
            .ok_or(RecordError::MissingField("title"))?;
        let investigator_name = raw
            .pd_pi_name
            .as_deref()
            .and_then(non_blank)
            .ok_or(RecordError::MissingField("pdPIName"))?;

        Ok(Self {
            title,
            investigator_name,
            investigator_email: raw.pi_email,
            organization: raw.awardee_name,
            abstract_text: raw.abstract_text,
            project_start: raw.start_date.as_deref().and_then(parse_award_date),
            project_end: raw.exp_date.as_deref().and_then(parse_award_date),
            program_officer_name: raw.po_name,
            program_officer_email: raw.po_email,
            program_officer_org_code: raw
                .award_agency_code
                .unwrap_or_else(|| DEFAULT_AGENCY_CODE.to_string()),
            fund_program_name: raw.fund_program_name,
            primary_program: raw.primary_program,
            external_id: raw.id.unwrap_or_default(),
        })
    }
}

/// Parse an index date. The index uses `MM/DD/YYYY`; ISO dates are accepted too.
pub fn parse_award_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// A candidate with its combined score. Lives for one match operation.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: AwardCandidate,
    pub score: f64,
}

/// A principal investigator on a matched award.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Investigator {
    pub name: String,
    pub email: Option<String>,
    pub organization: Option<String>,
}

/// The funding agency's contact for a matched award.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramOfficer {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Agency code (`4900` is NSF).
    pub organization: String,
}

/// Program identifiers attached to a matched award.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AwardIdentifiers {
    pub fund_program: Option<String>,
    pub primary_program: Option<String>,
}

/// The award selected for a funding record, ready for write-back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub title: String,
    pub description: Option<String>,
    pub project_start: Option<NaiveDate>,
    pub project_end: Option<NaiveDate>,
    pub principal_investigators: Vec<Investigator>,
    pub program_officer: ProgramOfficer,
    pub award_id: String,
    pub identifiers: AwardIdentifiers,
}
