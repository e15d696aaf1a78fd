//! Append-only findings log for borderline candidates.
//!
//! Each finding is one delimited block: the funding JSON as received from
//! the registry, the raw award-search response, and the score. The file is
//! written for human review and never read back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::traits::{Finding, FindingsSink};

const HEAVY_RULE: &str = "===================================================";
const LIGHT_RULE: &str = "---------------------------------------------------";

pub struct FindingsLog {
    path: PathBuf,
    // Serializes writers so blocks never interleave.
    lock: Mutex<()>,
}

impl FindingsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn render(finding: &Finding<'_>) -> Result<String> {
    let funding = serde_json::to_string(finding.funding)?;
    let response = serde_json::to_string(finding.response)?;
    Ok(format!(
        "{heavy}\n{heavy}\nRECORDED AT: {at}\nDMP JSON RECEIVED FROM REGISTRY:\n{funding}\n{light}\nAWARD SEARCH RESULTS:\n{response}\n{light}\n{score}\n",
        heavy = HEAVY_RULE,
        light = LIGHT_RULE,
        at = chrono::Utc::now().to_rfc3339(),
        funding = funding,
        response = response,
        score = finding.score,
    ))
}

#[async_trait]
impl FindingsSink for FindingsLog {
    async fn record(&self, finding: &Finding<'_>) -> Result<()> {
        let block = render(finding)?;

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open findings log: {}", self.path.display()))?;
        file.write_all(block.as_bytes())
            .await
            .with_context(|| format!("Failed to write findings log: {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("Failed to write findings log: {}", self.path.display()))?;
        Ok(())
    }
}
