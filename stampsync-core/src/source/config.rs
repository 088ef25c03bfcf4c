// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for sources and the HTTP transport

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use thiserror::Error;

use super::integrity::SignatureError;

/// Wait after a successful refresh; also the floor for a source's cache TTL.
pub const DEFAULT_PREFETCH_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Shortest wait between two refresh attempts of the same source.
pub const MINIMUM_PREFETCH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Suffix of the detached signature, both on mirrors and in the cache.
pub const SIGNATURE_SUFFIX: &str = ".minisig";

/// Default per-download timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on a downloaded list or signature (bytes).
pub const MAX_BODY_SIZE: u64 = 20 * 1024 * 1024;

/// Configuration of one source list
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source name, used in logs
    pub name: String,

    /// Mirror URLs, tried in order
    pub urls: Vec<String>,

    /// Base64 minisign public key
    pub minisign_key: String,

    /// Local cache file; the signature lives next to it with `.minisig`
    pub cache_file: PathBuf,

    /// List format ("v2")
    pub format: String,

    /// Cache TTL, raised to [`DEFAULT_PREFETCH_DELAY`] if shorter
    #[serde_as(as = "DurationSeconds<u64>")]
    pub refresh_delay: Duration,

    /// Timeout for each download
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,

    /// Maximum accepted size of a download (bytes)
    pub max_body_size: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            urls: Vec::new(),
            minisign_key: String::new(),
            cache_file: PathBuf::new(),
            format: "v2".to_string(),
            refresh_delay: DEFAULT_PREFETCH_DELAY,
            timeout: DEFAULT_TIMEOUT,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl SourceConfig {
    /// Create a config for a source with no mirrors yet
    pub fn new(name: &str, minisign_key: &str, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            minisign_key: minisign_key.to_string(),
            cache_file: cache_file.into(),
            ..Default::default()
        }
    }

    /// Append a mirror URL
    pub fn with_url(mut self, url: &str) -> Self {
        self.urls.push(url.to_string());
        self
    }

    /// Set the cache TTL
    pub fn with_refresh_delay(mut self, refresh_delay: Duration) -> Self {
        self.refresh_delay = refresh_delay;
        self
    }
}

/// Configuration of the HTTP transport shared by all sources
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Client-wide request timeout
    pub timeout: Duration,

    /// User-Agent header
    pub user_agent: String,

    /// Proxy URL (for Tor support)
    pub proxy_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("stampsync/{}", env!("CARGO_PKG_VERSION")),
            proxy_url: None,
        }
    }
}

impl TransportConfig {
    /// Configure with Tor proxy
    ///
    /// Uses the default Tor SOCKS5 proxy at 127.0.0.1:9050 and
    /// increases the timeout to 60 seconds to account for Tor latency.
    pub fn with_tor(mut self) -> Self {
        self.proxy_url = Some("socks5h://127.0.0.1:9050".to_string());
        self.timeout = Duration::from_secs(60);
        self
    }

    /// Configure with custom proxy
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        self.proxy_url = Some(proxy_url);
        self
    }
}

/// Errors in a source configuration; the source cannot be used
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Format string is not a known list format
    #[error("unsupported source format: [{0}]")]
    UnsupportedFormat(String),

    /// Public key could not be decoded
    #[error("invalid minisign public key: {0}")]
    InvalidPublicKey(#[source] SignatureError),
}
