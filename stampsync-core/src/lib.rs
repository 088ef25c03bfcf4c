// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Stampsync Core Library
//!
//! Keeps signed resolver lists fresh for a long-running DNS daemon.
//! Signature checks use the audited `ring` crate.

pub mod source;
pub mod stamp;

pub use source::{
    prefetch_sources, CacheStore, ConfigError, EntryError, FetchError, FormatError,
    MockTransport, ParsedServers, PublicKey, RegisteredServer, SignatureError, Source,
    SourceConfig, SourceError, SourceFormat, Transport, TransportConfig, VerifiedContent,
};
#[cfg(feature = "http")]
pub use source::HttpTransport;
pub use stamp::{ServerStamp, StampError, StampProperties, StampProtocol};
