//! # graph-export
//!
//! Concurrent exporter for tree-shaped social documents: fetches a post
//! together with its nested comment and reaction collections from a
//! Graph-style HTTP API, flattens each tree into a fixed 21-column row set,
//! and appends the rows to a single shared CSV stream.
//!
//! ## Design Philosophy
//!
//! - **Pipeline-first** — the interesting part is the concurrent fetch
//!   pipeline: a fixed-size worker pool over an unbounded identifier
//!   stream, global dedup, and per-batch atomic output
//! - **Patient under throttling** — rate-limited fetches back off and retry
//!   forever; every other failure abandons just that identifier
//! - **Deterministic per tree** — within one identifier the row order is
//!   fixed (root, its reactions, depth-first replies); across identifiers
//!   batches land in completion order
//!
//! ## Quick Start
//!
//! ```no_run
//! use graph_export::{Config, CsvWriter, GraphClient, export_posts};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = Arc::new(GraphClient::new(&config.api_base, "my-token"));
//!     let writer = Arc::new(CsvWriter::new(std::io::stdout()));
//!
//!     let input = tokio::io::BufReader::new(tokio::io::stdin());
//!     export_posts(&config, client, writer, input).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Fetch client for the Graph-style API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Orchestrator driving the identifier stream through the pipeline
pub mod exporter;
/// Post-hoc CSV row filter
pub mod filter;
/// Tree flattener
pub mod flatten;
/// Worker pool with barrier shutdown
pub mod pool;
/// Retry policy for rate-limited fetches
pub mod retry;
/// Core wire and row types
pub mod types;
/// Atomic CSV batch writer
pub mod writer;

// Re-export commonly used types
pub use client::{GraphClient, POST_FIELDS};
pub use config::Config;
pub use error::{Error, Result};
pub use exporter::export_posts;
pub use filter::filter_rows;
pub use flatten::{flatten, normalize_timestamp};
pub use pool::WorkerPool;
pub use retry::with_rate_limit_retry;
pub use types::{COLUMNS, Comment, Connection, Post, Reaction, Row};
pub use writer::CsvWriter;
