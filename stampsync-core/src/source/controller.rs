// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Source controller - keeps one signed list fresh
//!
//! A [`Source`] coordinates between:
//! - The local cache (preferred while it is fresh)
//! - The mirrors (fetched once the cache is stale or unusable)
//! - The signature gate, which both of the above must pass
//!
//! and computes when the list is next due for a refresh.
//!
//! Refreshing a single source is not reentrant: callers must not run two
//! `resolve` calls on the same source at once. `&mut self` enforces this
//! within one process. Different sources share nothing and may refresh
//! concurrently.

use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use super::cache::{CacheError, CacheStore};
use super::config::{
    ConfigError, SourceConfig, DEFAULT_PREFETCH_DELAY, MINIMUM_PREFETCH_INTERVAL,
};
use super::fetcher::{FetchError, MirrorFetcher, Transport};
use super::integrity::PublicKey;
use super::parser::{parse_v2, FormatError, ParsedServers};
use super::types::{SourceFormat, VerifiedContent};

/// One signed list, its cache, and its refresh schedule
#[derive(Debug)]
pub struct Source {
    name: String,
    urls: Vec<Url>,
    format: SourceFormat,
    key: PublicKey,
    cache: CacheStore,
    cache_ttl: Duration,
    prefetch_delay: Duration,
    timeout: Duration,
    max_body_size: u64,
    content: Option<VerifiedContent>,
    refresh: Option<SystemTime>,
}

impl Source {
    /// Validate a configuration without touching the cache or network
    ///
    /// Unparseable mirror URLs are logged and dropped.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ConfigError> {
        let format: SourceFormat = config.format.parse()?;
        let key =
            PublicKey::from_base64(&config.minisign_key).map_err(ConfigError::InvalidPublicKey)?;

        let urls = config
            .urls
            .iter()
            .filter_map(|url| match Url::parse(url) {
                Ok(url) => Some(url),
                Err(error) => {
                    warn!(source = %config.name, url = %url, %error, "Failed to parse source URL");
                    None
                }
            })
            .collect();

        Ok(Self {
            name: config.name.clone(),
            urls,
            format,
            key,
            cache: CacheStore::new(&config.cache_file),
            cache_ttl: config.refresh_delay.max(DEFAULT_PREFETCH_DELAY),
            prefetch_delay: DEFAULT_PREFETCH_DELAY,
            timeout: config.timeout,
            max_body_size: config.max_body_size,
            content: None,
            refresh: None,
        })
    }

    /// Build a source and load it from cache or mirrors
    ///
    /// A failed mirror walk is tolerated when a verified cache was adopted;
    /// every other failure means the source has nothing trusted to offer.
    pub async fn new<T: Transport + ?Sized>(
        config: &SourceConfig,
        transport: &T,
        now: SystemTime,
    ) -> Result<Self, SourceError> {
        let mut source = Self::from_config(config)?;

        match source.resolve(transport, now).await {
            Ok(_) => info!(source = %source.name, format = %source.format, "Source loaded"),
            Err(error @ SourceError::AllMirrorsFailed { .. }) if source.content.is_some() => {
                warn!(source = %source.name, %error, "Source loaded from stale cache");
            }
            Err(error) => return Err(error),
        }

        Ok(source)
    }

    /// Load from cache, falling back to the mirrors, and reschedule
    ///
    /// Returns the delay until the next refresh. When at least one mirror
    /// is configured, the next refresh time is updated on every call,
    /// including failed ones, and is never sooner than
    /// [`MINIMUM_PREFETCH_INTERVAL`] after a fetch attempt.
    pub async fn resolve<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        now: SystemTime,
    ) -> Result<Duration, SourceError> {
        let delay = match self.load_from_cache(now) {
            Ok(delay) => delay,
            Err(cause) if self.urls.is_empty() => {
                error!(
                    source = %self.name,
                    path = %self.cache.path().display(),
                    %cause,
                    "Cache file not present and no valid URL"
                );
                return Err(SourceError::NoTrustedContent {
                    name: self.name.clone(),
                    cause,
                });
            }
            Err(cause) => {
                debug!(
                    source = %self.name,
                    path = %self.cache.path().display(),
                    %cause,
                    "Cache file not usable"
                );
                Duration::ZERO
            }
        };

        if self.urls.is_empty() {
            return Ok(delay);
        }
        if !delay.is_zero() {
            self.refresh = Some(now + delay);
            return Ok(delay);
        }

        let fetcher = MirrorFetcher::new(transport, self.timeout, self.max_body_size);
        let (delay, result) = match fetcher.fetch(&self.name, &self.urls, &self.key).await {
            Ok(content) => {
                self.write_to_cache(&content);
                self.content = Some(content);
                (self.prefetch_delay, Ok(self.prefetch_delay))
            }
            Err(cause) => (
                MINIMUM_PREFETCH_INTERVAL,
                Err(SourceError::AllMirrorsFailed {
                    name: self.name.clone(),
                    cause,
                }),
            ),
        };

        self.refresh = Some(now + delay);
        result
    }

    /// Parse the current content into server entries
    ///
    /// Entry names are prefixed with `prefix`.
    pub fn parse(&self, prefix: &str) -> Result<ParsedServers, FormatError> {
        let text = self
            .content
            .as_ref()
            .map(VerifiedContent::text)
            .unwrap_or_default();
        match self.format {
            SourceFormat::V2 => parse_v2(&self.name, prefix, &text),
        }
    }

    /// Whether a prefetch sweep should refresh this source at `now`
    ///
    /// Sources without mirrors are never due.
    pub fn refresh_due(&self, now: SystemTime) -> bool {
        matches!(self.refresh, Some(at) if at <= now)
    }

    /// Source name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mirror URLs that parsed
    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Effective cache TTL
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Verified content, if any was ever loaded
    pub fn content(&self) -> Option<&VerifiedContent> {
        self.content.as_ref()
    }

    /// Next scheduled refresh; `None` when the source has no mirrors
    pub fn next_refresh(&self) -> Option<SystemTime> {
        self.refresh
    }

    /// Adopt the cached pair if it verifies, and report how long it stays
    /// fresh (zero once stale)
    fn load_from_cache(&mut self, now: SystemTime) -> Result<Duration, CacheError> {
        let (blob, signature) = self.cache.load()?;
        self.content = Some(self.key.verify_detached(blob, signature)?);

        let elapsed = self.cache.age(now)?;
        if elapsed < self.cache_ttl {
            let delay = self.prefetch_delay.saturating_sub(elapsed);
            debug!(
                source = %self.name,
                path = %self.cache.path().display(),
                next_update = ?delay,
                "Cache file is still fresh"
            );
            Ok(delay)
        } else {
            debug!(
                source = %self.name,
                path = %self.cache.path().display(),
                "Cache file needs to be refreshed"
            );
            Ok(Duration::ZERO)
        }
    }

    /// Persist freshly verified content; failures are logged only
    fn write_to_cache(&self, content: &VerifiedContent) {
        if let Err(error) = self.cache.store(content.bytes(), content.signature()) {
            let path = std::path::absolute(self.cache.path())
                .unwrap_or_else(|_| self.cache.path().to_path_buf());
            warn!(source = %self.name, path = %path.display(), %error, "Failed to write cache");
        }
    }
}

/// Errors that can occur while loading or refreshing a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No mirrors and no usable cache
    #[error("source [{name}]: cache file not present and no valid URL: {cause}")]
    NoTrustedContent {
        /// Source name
        name: String,
        /// Why the cache was not usable
        #[source]
        cause: CacheError,
    },

    /// Every mirror failed; earlier verified content stays in use
    #[error("source [{name}]: {cause}")]
    AllMirrorsFailed {
        /// Source name
        name: String,
        /// Mirror walk failure
        #[source]
        cause: FetchError,
    },
}
