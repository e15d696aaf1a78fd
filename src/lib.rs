//! # Award Sync
//!
//! Reconciles Data Management Plan (DMP) funding records held by a DMP
//! registry with awards published by a grants-search index, and writes
//! confirmed matches back to the registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ DMP registry │──▶│ SyncPipeline │──▶│ AwardMatcher │──▶ award index
//! │ (paged feed) │◀──│              │   └──────┬───────┘
//! └──────────────┘   └──────┬───────┘          │
//!    write-back             ▼                  ▼
//!                    processed set       findings log
//! ```
//!
//! Scoring, normalization, and the data model live in
//! [`award_sync_core`]; this crate supplies the HTTP clients, file-backed
//! state, and the `awards` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! awards status                 # show endpoints and processed count
//! awards match "EAGER: Coral Reef Resilience" --author "Jane Roe|UC San Diego"
//! awards sync --dry-run         # match without writing back
//! awards sync                   # full run
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Upstream error kinds |
//! | [`auth`] | OAuth2 client-credentials token |
//! | [`registry`] | DMP registry client and write-back payload |
//! | [`award_search`] | Grants-search index client |
//! | [`traits`] | Seams between the pipeline and upstream services |
//! | [`matcher`] | Award matching for one funding record |
//! | [`pipeline`] | Feed walk, write-back, processed marking |
//! | [`processed`] | File-backed processed-record set |
//! | [`findings`] | Borderline findings log |
//! | [`progress`] | Sync progress reporting |
//! | [`status`] | `awards status` output |

pub mod auth;
pub mod award_search;
pub mod config;
pub mod error;
pub mod findings;
pub mod matcher;
pub mod pipeline;
pub mod processed;
pub mod progress;
pub mod registry;
pub mod status;
pub mod traits;
