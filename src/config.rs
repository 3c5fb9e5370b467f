//! Configuration types for graph-export

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the export pipeline
///
/// All fields have sensible defaults; a zero-configuration run only needs an
/// access token. Deserializable so embedders can load it from JSON alongside
/// their own settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Graph-style API (default: Facebook Graph v2.11)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Number of concurrent fetch workers (default: 100)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Fixed back-off before retrying a rate-limited fetch (default: 5 minutes)
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff: Duration,

    /// Page size for paginated feed listing (default: 100)
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            workers: default_workers(),
            rate_limit_backoff: default_rate_limit_backoff(),
            feed_page_size: default_feed_page_size(),
        }
    }
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v2.11".to_string()
}

fn default_workers() -> usize {
    100
}

fn default_rate_limit_backoff() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_feed_page_size() -> u32 {
    100
}
