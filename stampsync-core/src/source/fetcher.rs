// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mirror fetcher for downloading signed source lists
//!
//! This module provides:
//! - The [`Transport`] abstraction over "GET a URL with a timeout"
//! - An HTTP transport with size limits and proxy support (for Tor)
//! - [`MirrorFetcher`], which walks mirrors in order until one serves a
//!   list whose detached signature verifies

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[cfg(feature = "http")]
use super::config::TransportConfig;
use super::config::SIGNATURE_SUFFIX;
use super::integrity::{PublicKey, SignatureError};
use super::types::VerifiedContent;

#[cfg(feature = "http")]
use reqwest::Client;

/// Fetch capability: download the body at a URL
///
/// Implementations must give up once the body exceeds `max_len` bytes.
/// Retries, if any, belong here and not in the callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download the body at `url`
    async fn get(&self, url: &Url, timeout: Duration, max_len: u64) -> Result<Vec<u8>, FetchError>;
}

/// Fetches from HTTP(S) mirrors
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport from config
    pub fn new(config: &TransportConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        // Support proxy if configured (for Tor)
        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, timeout: Duration, max_len: u64) -> Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url.clone()).timeout(timeout).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        // Check content length before downloading
        if let Some(len) = response.content_length() {
            if len > max_len {
                return Err(FetchError::TooLarge {
                    size: len,
                    max: max_len,
                });
            }
        }

        // Stream the body so an oversized response is never buffered whole
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > max_len {
                return Err(FetchError::TooLarge { size, max: max_len });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

/// Derive the URL of a list's detached signature
pub fn signature_url(url: &Url) -> Url {
    let mut signature_url = url.clone();
    let path = format!("{}{}", url.path(), SIGNATURE_SUFFIX);
    signature_url.set_path(&path);
    signature_url
}

/// Result of trying a single mirror
#[derive(Debug)]
pub enum MirrorOutcome {
    /// List and signature downloaded and the signature verified
    Verified(VerifiedContent),
    /// Both files downloaded but the signature did not verify
    Rejected(SignatureError),
    /// List or signature could not be downloaded
    NetworkFailed(FetchError),
}

/// Downloads a signed list from the first mirror that serves a valid one
pub struct MirrorFetcher<'a, T: Transport + ?Sized> {
    transport: &'a T,
    timeout: Duration,
    body_cap: u64,
}

impl<'a, T: Transport + ?Sized> MirrorFetcher<'a, T> {
    /// Create a fetcher; `body_cap` bounds both the list and the signature
    pub fn new(transport: &'a T, timeout: Duration, body_cap: u64) -> Self {
        Self {
            transport,
            timeout,
            body_cap,
        }
    }

    /// Try mirrors in order and return the first verified list
    ///
    /// A mirror that is down or serves a bad signature does not stop the
    /// walk; the error reports the last failure seen.
    pub async fn fetch(
        &self,
        source_name: &str,
        mirrors: &[Url],
        key: &PublicKey,
    ) -> Result<VerifiedContent, FetchError> {
        let mut last = None;

        for url in mirrors {
            info!(source = source_name, url = %url, "Loading source from URL");
            let failure = match self.attempt(url, key).await {
                MirrorOutcome::Verified(content) => return Ok(content),
                MirrorOutcome::Rejected(error) => {
                    debug!(source = source_name, url = %url, %error, "Signature check failed");
                    MirrorFailure::Signature {
                        url: url.clone(),
                        source: error,
                    }
                }
                MirrorOutcome::NetworkFailed(error) => {
                    debug!(source = source_name, url = %url, %error, "Download failed");
                    MirrorFailure::Network {
                        url: url.clone(),
                        source: error,
                    }
                }
            };
            last = Some(failure);
        }

        match last {
            Some(last) => Err(FetchError::AllMirrorsFailed {
                attempts: mirrors.len(),
                last: Box::new(last),
            }),
            None => Err(FetchError::NoMirrors),
        }
    }

    /// Download and verify one mirror's list and signature
    pub async fn attempt(&self, url: &Url, key: &PublicKey) -> MirrorOutcome {
        let blob = match self.download(url).await {
            Ok(blob) => blob,
            Err(error) => return MirrorOutcome::NetworkFailed(error),
        };
        let signature = match self.download(&signature_url(url)).await {
            Ok(signature) => signature,
            Err(error) => return MirrorOutcome::NetworkFailed(error),
        };

        match key.verify_detached(blob, signature) {
            Ok(content) => MirrorOutcome::Verified(content),
            Err(error) => MirrorOutcome::Rejected(error),
        }
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let body = self.transport.get(url, self.timeout, self.body_cap).await?;

        // Transports are asked to cap the body; enforce it regardless
        if body.len() as u64 > self.body_cap {
            return Err(FetchError::TooLarge {
                size: body.len() as u64,
                max: self.body_cap,
            });
        }
        Ok(body)
    }
}

/// Why a single mirror was skipped
#[derive(Debug, Error)]
pub enum MirrorFailure {
    /// List or signature download failed
    #[error("download from {url} failed: {source}")]
    Network {
        /// Mirror URL
        url: Url,
        /// Underlying error
        source: FetchError,
    },

    /// Signature did not verify
    #[error("signature from {url} rejected: {source}")]
    Signature {
        /// Mirror URL
        url: Url,
        /// Underlying error
        source: SignatureError,
    },
}

/// Errors that can occur during mirror fetching
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP error with status code
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Network/request error
    #[cfg(feature = "http")]
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body exceeds the configured cap
    #[error("content too large: {size} bytes (max {max})")]
    TooLarge {
        /// Size seen so far in bytes
        size: u64,
        /// Maximum allowed size in bytes
        max: u64,
    },

    /// No mirror yielded a verified list
    #[error("all {attempts} mirror(s) failed, last: {last}")]
    AllMirrorsFailed {
        /// Number of mirrors tried
        attempts: usize,
        /// Last failure seen
        #[source]
        last: Box<MirrorFailure>,
    },

    /// The mirror list was empty
    #[error("no mirror configured")]
    NoMirrors,
}
