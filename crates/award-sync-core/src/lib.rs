//! # Award Sync Core
//!
//! Pure logic for reconciling DMP registry funding records with awards from a
//! grants-search index: data models, title normalization, similarity scoring,
//! candidate selection, and the processed-record store abstraction.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. The calling
//! application fetches records and candidates, feeds them through
//! [`matching::evaluate`] and [`matching::select_match`], and persists
//! progress through a [`store::ProcessedStore`] implementation.

pub mod matching;
pub mod models;
pub mod normalize;
pub mod similarity;
pub mod store;
