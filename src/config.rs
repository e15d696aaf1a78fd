use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use award_sync_core::matching::{
    MatchPolicy, DEFAULT_ACCEPT_THRESHOLD, DEFAULT_BORDERLINE_FLOOR, DEFAULT_SHOW_AWARD_URL,
};
use award_sync_core::similarity::{SimilarityScorer, DEFAULT_AUTHOR_TRUST_THRESHOLD};

/// Environment variable consulted when `registry.client_secret` is not in the file.
pub const CLIENT_SECRET_ENV: &str = "DMP_REGISTRY_CLIENT_SECRET";

pub const NSF_FUNDER_ID: &str = "http://dx.doi.org/10.13039/100000001";
pub const NASA_FUNDER_ID: &str = "http://dx.doi.org/10.13039/100000104";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub registry: RegistryConfig,
    #[serde(default)]
    pub awards: AwardsConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_index_path() -> String {
    "/api/v0/awards".to_string()
}
fn default_token_path() -> String {
    "/oauth/token".to_string()
}
fn default_user_agent() -> String {
    format!("award-sync/{}", env!("CARGO_PKG_VERSION"))
}

impl RegistryConfig {
    /// URL of the first page of the funding feed.
    pub fn index_url(&self) -> String {
        join_url(&self.base_url, &self.index_path)
    }

    pub fn token_url(&self) -> String {
        join_url(&self.base_url, &self.token_path)
    }

    /// Client secret from the file, or from [`CLIENT_SECRET_ENV`].
    pub fn resolve_client_secret(&self) -> Result<String> {
        if let Some(secret) = self.client_secret.as_ref().filter(|s| !s.is_empty()) {
            return Ok(secret.clone());
        }
        std::env::var(CLIENT_SECRET_ENV).with_context(|| {
            format!(
                "registry.client_secret not set and {} not in environment",
                CLIENT_SECRET_ENV
            )
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AwardsConfig {
    #[serde(default = "default_awards_base_url")]
    pub base_url: String,
    #[serde(default = "default_awards_path")]
    pub awards_path: String,
    #[serde(default = "default_show_award_url")]
    pub show_award_url: String,
    #[serde(default = "default_print_fields")]
    pub print_fields: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AwardsConfig {
    fn default() -> Self {
        Self {
            base_url: default_awards_base_url(),
            awards_path: default_awards_path(),
            show_award_url: default_show_award_url(),
            print_fields: default_print_fields(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

fn default_awards_base_url() -> String {
    "https://api.nsf.gov/services/v1".to_string()
}
fn default_awards_path() -> String {
    "/awards.json".to_string()
}
fn default_show_award_url() -> String {
    DEFAULT_SHOW_AWARD_URL.to_string()
}
fn default_print_fields() -> Vec<String> {
    [
        "id",
        "title",
        "piName",
        "piEmail",
        "abstractText",
        "poName",
        "poEmail",
        "startDate",
        "expDate",
        "awardeeName",
        "fundProgramName",
        "pdPIName",
        "primaryProgram",
        "fundAgencyCode",
        "awardAgencyCode",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AwardsConfig {
    pub fn search_url(&self) -> String {
        join_url(&self.base_url, &self.awards_path)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_borderline_floor")]
    pub borderline_floor: f64,
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,
    #[serde(default = "default_author_trust_threshold")]
    pub author_trust_threshold: f64,
    /// Funders the award index covers. Empty accepts every funder.
    #[serde(default = "default_funder_ids")]
    pub funder_ids: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            borderline_floor: default_borderline_floor(),
            accept_threshold: default_accept_threshold(),
            author_trust_threshold: default_author_trust_threshold(),
            funder_ids: default_funder_ids(),
        }
    }
}

fn default_borderline_floor() -> f64 {
    DEFAULT_BORDERLINE_FLOOR
}
fn default_accept_threshold() -> f64 {
    DEFAULT_ACCEPT_THRESHOLD
}
fn default_author_trust_threshold() -> f64 {
    DEFAULT_AUTHOR_TRUST_THRESHOLD
}
fn default_funder_ids() -> Vec<String> {
    vec![NSF_FUNDER_ID.to_string(), NASA_FUNDER_ID.to_string()]
}

impl MatchingConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            borderline_floor: self.borderline_floor,
            accept_threshold: self.accept_threshold,
        }
    }

    pub fn scorer(&self) -> SimilarityScorer {
        SimilarityScorer::new(self.author_trust_threshold)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_processed_path")]
    pub processed_path: PathBuf,
    #[serde(default = "default_findings_path")]
    pub findings_path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            processed_path: default_processed_path(),
            findings_path: default_findings_path(),
        }
    }
}

fn default_processed_path() -> PathBuf {
    PathBuf::from("./data/processed.txt")
}
fn default_findings_path() -> PathBuf {
    PathBuf::from("./data/findings.log")
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.registry.base_url.trim().is_empty() {
        anyhow::bail!("registry.base_url must not be empty");
    }
    if config.registry.client_id.trim().is_empty() {
        anyhow::bail!("registry.client_id must not be empty");
    }
    if config.awards.base_url.trim().is_empty() {
        anyhow::bail!("awards.base_url must not be empty");
    }

    let m = &config.matching;
    for (name, value) in [
        ("matching.borderline_floor", m.borderline_floor),
        ("matching.accept_threshold", m.accept_threshold),
        ("matching.author_trust_threshold", m.author_trust_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("{} must be in [0.0, 1.0]", name);
        }
    }
    if m.borderline_floor > m.accept_threshold {
        anyhow::bail!("matching.borderline_floor must be <= matching.accept_threshold");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!(
            r#"
[registry]
base_url = "http://localhost:3003/"
client_id = "scanner"
client_secret = "s3cret"
{}
"#,
            extra
        );
        let config: Config = toml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.registry.index_url(), "http://localhost:3003/api/v0/awards");
        assert_eq!(cfg.registry.token_url(), "http://localhost:3003/oauth/token");
        assert_eq!(
            cfg.awards.search_url(),
            "https://api.nsf.gov/services/v1/awards.json"
        );
        assert_eq!(cfg.matching.policy(), MatchPolicy::default());
        assert!(cfg.registry.timeout_secs.is_none());
        assert!(cfg.awards.print_fields.iter().any(|f| f == "pdPIName"));
    }

    #[test]
    fn default_funders_are_nsf_and_nasa() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.matching.funder_ids, vec![NSF_FUNDER_ID, NASA_FUNDER_ID]);

        let open = parse("[matching]\nfunder_ids = []").unwrap();
        assert!(open.matching.funder_ids.is_empty());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = parse("[matching]\nborderline_floor = 0.8\naccept_threshold = 0.6").unwrap_err();
        assert!(err.to_string().contains("borderline_floor"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = parse("[matching]\nauthor_trust_threshold = 1.5").unwrap_err();
        assert!(err.to_string().contains("author_trust_threshold"));
    }

    #[test]
    fn client_secret_from_file_wins() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.registry.resolve_client_secret().unwrap(), "s3cret");
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/awards.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
