//! # Award Sync CLI (`awards`)
//!
//! ## Usage
//!
//! ```bash
//! awards --config ./config/awards.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `awards sync` | Walk the registry feed, match awards, write them back |
//! | `awards match "<title>"` | Match one ad-hoc funding record and print the result |
//! | `awards status` | Show configured endpoints and the processed-record count |
//!
//! Logs go to stderr and honour `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use award_sync::award_search::AwardSearchClient;
use award_sync::config::{self, NSF_FUNDER_ID};
use award_sync::findings::FindingsLog;
use award_sync::matcher::AwardMatcher;
use award_sync::pipeline::{self, SyncOptions};
use award_sync::progress::ProgressMode;
use award_sync::status;
use award_sync_core::models::FundingRecord;

/// Award Sync: match DMP registry funding records to published awards.
#[derive(Parser)]
#[command(
    name = "awards",
    about = "Match DMP registry funding records to published grant awards",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/awards.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the registry feed and write matched awards back.
    ///
    /// Records already in the processed set are skipped. Every record for
    /// which matching was attempted is marked processed.
    Sync {
        /// Match only: do not write back or mark records processed.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of records to attempt matching for.
        #[arg(long)]
        limit: Option<usize>,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Match a single ad-hoc funding record and print the result as JSON.
    Match {
        /// Project title to search for.
        title: String,

        /// Author as `name|organization`. Repeatable.
        #[arg(long = "author")]
        authors: Vec<String>,

        /// Funder identifier URI.
        #[arg(long, default_value = NSF_FUNDER_ID)]
        funder: String,
    },

    /// Show configured endpoints and the processed-record count.
    Status,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        tracing::error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            tracing::error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sync {
            dry_run,
            limit,
            progress,
        } => {
            let options = SyncOptions { dry_run, limit };
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let stats = pipeline::run_sync(&cfg, options, mode).await?;
            if mode == ProgressMode::Json {
                println!("{}", serde_json::to_string(&stats)?);
            } else {
                stats.print_summary(dry_run);
            }
        }
        Commands::Match {
            title,
            authors,
            funder,
        } => {
            let record = FundingRecord::from_value(json!({
                "projectTitle": title,
                "authors": authors,
                "funderId": funder,
                "update_url": "urn:award-sync:adhoc",
            }))
            .context("Invalid funding record")?;

            let index = AwardSearchClient::new(&cfg.awards)?;
            let findings = FindingsLog::new(cfg.state.findings_path.clone());
            let matcher = AwardMatcher::new(Arc::new(index), Arc::new(findings), &cfg);

            match matcher.find_award(&record).await? {
                Some(award) => println!("{}", serde_json::to_string_pretty(&award)?),
                None => println!("no match"),
            }
        }
        Commands::Status => {
            status::print_status(&cfg)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
