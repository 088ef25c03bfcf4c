// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Type definitions shared by the source modules
//!
//! These types represent the list format of a source, the verified bytes
//! it holds, and the server entries parsed out of them.

use std::borrow::Cow;
use std::str::FromStr;

use super::config::ConfigError;
use crate::stamp::ServerStamp;

/// Text format of a source list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `## name` sections with one `sdns:` stamp each
    V2,
}

impl SourceFormat {
    /// Name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::V2 => "v2",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(SourceFormat::V2),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source list bytes together with the detached signature they passed.
///
/// Only signature verification can construct this type, so holding one is
/// proof that the bytes were checked against a trusted key.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifiedContent {
    blob: Vec<u8>,
    signature: Vec<u8>,
}

impl VerifiedContent {
    pub(super) fn new(blob: Vec<u8>, signature: Vec<u8>) -> Self {
        Self { blob, signature }
    }

    /// Verified list bytes
    pub fn bytes(&self) -> &[u8] {
        &self.blob
    }

    /// Detached signature that authenticated the bytes
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// List bytes as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.blob)
    }
}

impl std::fmt::Debug for VerifiedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifiedContent")
            .field("len", &self.blob.len())
            .finish()
    }
}

/// A server entry parsed from a source list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredServer {
    /// Entry name, prefixed with the caller-supplied prefix
    pub name: String,
    /// Decoded connection descriptor
    pub stamp: ServerStamp,
    /// Free-form description lines, newline-joined
    pub description: String,
}
