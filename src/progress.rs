//! Sync progress reporting.
//!
//! Reports observable progress during `awards sync` so operators see which
//! page is being walked and what happened to each record. Progress is
//! emitted on **stderr** so stdout stays parseable for scripts.

use std::io::Write;

use crate::pipeline::RecordOutcome;

/// A single progress event for sync.
#[derive(Clone, Debug)]
pub enum SyncProgressEvent {
    /// A feed page was fetched. `page` counts from 1.
    PageFetched { page: u64, url: String, items: u64 },
    /// A record reached a final outcome. `n` counts records seen this run.
    RecordProcessed {
        n: u64,
        update_url: Option<String>,
        outcome: RecordOutcome,
    },
}

/// Reports sync progress. Implementations write to stderr (human or JSON).
pub trait SyncProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the sync pipeline.
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: "sync page 3  25 items".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::PageFetched { page, items, .. } => {
                format!(
                    "sync page {}  {} items\n",
                    format_number(*page),
                    format_number(*items)
                )
            }
            SyncProgressEvent::RecordProcessed {
                n,
                update_url,
                outcome,
            } => format!(
                "sync record {}  {:<18} {}\n",
                format_number(*n),
                outcome.as_str(),
                update_url.as_deref().unwrap_or("-")
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        let obj = match &event {
            SyncProgressEvent::PageFetched { page, url, items } => serde_json::json!({
                "event": "page",
                "page": page,
                "url": url,
                "items": items
            }),
            SyncProgressEvent::RecordProcessed {
                n,
                update_url,
                outcome,
            } => serde_json::json!({
                "event": "record",
                "n": n,
                "update_url": update_url,
                "outcome": outcome.as_str()
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
