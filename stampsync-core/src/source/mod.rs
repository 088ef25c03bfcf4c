// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Signed source lists
//!
//! Provides functionality for keeping resolver lists fresh:
//! - Downloading lists and their minisign signatures from ordered mirrors
//! - Caching verified lists locally with atomic writes
//! - Scheduling refreshes, with a floor between attempts
//! - Parsing verified lists into server entries
//!
//! Nothing is adopted, from the cache or the network, before its
//! signature verifies against the source's public key.

mod cache;
mod config;
mod controller;
mod fetcher;
mod integrity;
pub mod mock;
mod parser;
mod prefetch;
mod types;

pub use cache::{signature_path, CacheError, CacheStore};
pub use config::{
    ConfigError, SourceConfig, TransportConfig, DEFAULT_PREFETCH_DELAY, DEFAULT_TIMEOUT,
    MAX_BODY_SIZE, MINIMUM_PREFETCH_INTERVAL, SIGNATURE_SUFFIX,
};
pub use controller::{Source, SourceError};
#[cfg(feature = "http")]
pub use fetcher::HttpTransport;
pub use fetcher::{signature_url, FetchError, MirrorFailure, MirrorFetcher, MirrorOutcome, Transport};
pub use integrity::{check_signature, PublicKey, Signature, SignatureError, SigningKeyPair};
pub use mock::MockTransport;
pub use parser::{parse_v2, EntryError, FormatError, ParsedServers};
pub use prefetch::prefetch_sources;
pub use types::{RegisteredServer, SourceFormat, VerifiedContent};
