//! File-backed [`ProcessedStore`].
//!
//! One `update_url` per line, append-only. Loading accepts LF and CRLF
//! endings and trims surrounding whitespace, and keys are trimmed the same
//! way on lookup and insert so a stored key always matches its lookup.
//! Each `add` is flushed and synced before the key counts as present.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use award_sync_core::store::ProcessedStore;

struct State {
    keys: HashSet<String>,
    file: File,
}

pub struct FileProcessedStore {
    path: PathBuf,
    state: Mutex<State>,
}

fn parse_keys(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_keys(path: &Path) -> Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read processed set: {}", path.display()))?;
    Ok(parse_keys(&content))
}

/// Count the keys stored at `path` without creating anything.
/// Returns `None` when the file does not exist yet.
pub fn count_keys(path: &Path) -> Result<Option<usize>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(read_keys(path)?.len()))
}

impl FileProcessedStore {
    /// Open (creating if needed) the store at `path` and load its keys.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open processed set: {}", path.display()))?;
        let keys = read_keys(&path)?;

        Ok(Self {
            path,
            state: Mutex::new(State { keys, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProcessedStore for FileProcessedStore {
    async fn reload(&self) -> Result<()> {
        let keys = read_keys(&self.path)?;
        self.state.lock().await.keys = keys;
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.state.lock().await.keys.contains(key.trim()))
    }

    async fn add(&self, key: &str) -> Result<bool> {
        let key = key.trim();
        let mut state = self.state.lock().await;
        if key.is_empty() || state.keys.contains(key) {
            return Ok(false);
        }

        let file = &mut state.file;
        writeln!(file, "{}", key)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .with_context(|| format!("Failed to append to processed set: {}", self.path.display()))?;

        state.keys.insert(key.to_string());
        Ok(true)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.state.lock().await.keys.len())
    }
}
