//! Multi-source document harvesting with persistent deduplication.
//!
//! `docufetch` queries academic search engines, citation indexes and news feeds for a set of
//! keywords, normalizes every result into a single [`Document`](document::Document) schema and
//! gates storage through a content-addressed deduplication store, so repeated runs only ever
//! surface documents that have not been seen before.
//!
//! # Features
//!
//! - **Many sources**: arXiv, Google Scholar, Semantic Scholar, CORE, Crossref, Unpaywall,
//!   PubMed, DOAJ, OpenAIRE and a set of news outlet feeds
//! - **Cross-source identity**: papers with the same title and authors collapse to one
//!   fingerprint regardless of where they were found
//! - **Incremental downloads**: artifacts are written atomically and never fetched twice
//! - **Failure isolation**: one misbehaving source never hides results from the others
//!
//! # Getting Started
//!
//! ```no_run
//! use docufetch::{config::Config, manager::Manager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let config = Config::default().with_keywords(["graph neural networks"]);
//!   let manager = Manager::new(config)?;
//!
//!   // Count what is out there first, without touching the metadata store
//!   let preview = manager.preview_report(&manager.config().keywords).await;
//!   println!("{} new documents", preview.total());
//!
//!   // Then store exactly what was previewed
//!   let stored = manager.persist(preview).await;
//!   for (source, documents) in stored.iter() {
//!     println!("{source}: {}", documents.len());
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`document`]: the canonical document type and the [`Source`](document::Source) enum
//! - [`sources`]: per-source adapters that build requests and normalize responses
//! - [`fetcher`]: the generic fetch, dedup and persist loop shared by every source
//! - [`dedup`]: the fingerprint store
//! - [`storage`]: metadata files and artifact downloads
//! - [`manager`]: fan-out over all enabled sources
//! - [`http`]: the HTTP boundary and rate-limit handling
//! - [`config`]: the immutable configuration value

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod http;
pub mod manager;
pub mod sources;
pub mod storage;

use crate::{
  config::*, dedup::*, document::*, error::*, fetcher::*, http::*, sources::*, storage::*,
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use docufetch::prelude::*;
///
/// async fn example() -> Result<(), DocuFetchError> {
///   let manager = Manager::new(Config::default())?;
///   let counts = manager.preview(&["rust".to_string()]).await;
///   println!("{counts:?}");
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    config::Config,
    document::{Document, Source},
    error::DocuFetchError,
    fetcher::FetchMode,
    http::HttpClient,
    manager::{Manager, Report},
    sources::Adapter,
  };
}
