// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parser for the v2 source list format
//!
//! ```text
//! ## server-name
//! Free text description,
//! possibly on several lines.
//! // comment
//! sdns://...
//! ```
//!
//! A bad entry is reported and skipped; only input that has no section at
//! all (or a section without a name) fails the whole parse.

use thiserror::Error;
use tracing::{debug, warn};

use super::types::RegisteredServer;
use crate::stamp::{ServerStamp, StampError};

const SECTION_MARKER: &str = "## ";
const STAMP_PREFIX: &str = "sdns:";
const COMMENT_PREFIX: &str = "//";

/// Servers parsed from a list, along with the entries that were skipped
#[derive(Debug, Default)]
pub struct ParsedServers {
    /// Valid entries, in list order
    pub servers: Vec<RegisteredServer>,
    /// Skipped entries, in list order
    pub errors: Vec<EntryError>,
}

impl ParsedServers {
    /// Whether every entry parsed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// All entry errors joined into one message, if there are any
    pub fn joined_error(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        Some(messages.join(", "))
    }
}

/// Parse a v2 list, prefixing every entry name with `prefix`
///
/// `source_name` only appears in errors.
pub fn parse_v2(source_name: &str, prefix: &str, text: &str) -> Result<ParsedServers, FormatError> {
    let sections: Vec<&str> = text.split(SECTION_MARKER).skip(1).collect();
    if sections.is_empty() {
        return Err(FormatError::NoSections {
            source_name: source_name.to_string(),
        });
    }

    let mut parsed = ParsedServers::default();
    for (index, section) in sections.into_iter().enumerate() {
        let mut lines = section.trim().lines();
        let name = lines.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(FormatError::UnnamedSection {
                source_name: source_name.to_string(),
                index,
            });
        }

        match parse_entry(format!("{prefix}{name}"), lines) {
            Ok(server) => {
                debug!(name = %server.name, stamp = %server.stamp, "Registered server");
                parsed.servers.push(server);
            }
            Err(error) => {
                warn!(source = source_name, %error, "Skipping list entry");
                parsed.errors.push(error);
            }
        }
    }

    Ok(parsed)
}

fn parse_entry<'a>(
    name: String,
    lines: impl Iterator<Item = &'a str>,
) -> Result<RegisteredServer, EntryError> {
    let mut stamp_line: Option<&str> = None;
    let mut description = String::new();

    for line in lines.map(str::trim) {
        if line.starts_with(STAMP_PREFIX) {
            if stamp_line.is_some() {
                return Err(EntryError::MultipleStamps { name });
            }
            stamp_line = Some(line);
        } else if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        } else {
            if !description.is_empty() {
                description.push('\n');
            }
            description.push_str(line);
        }
    }

    let Some(stamp_line) = stamp_line.filter(|line| line.len() > STAMP_PREFIX.len()) else {
        return Err(EntryError::MissingStamp { name });
    };

    match stamp_line.parse::<ServerStamp>() {
        Ok(stamp) => Ok(RegisteredServer {
            name,
            stamp,
            description,
        }),
        Err(source) => Err(EntryError::InvalidStamp {
            name,
            stamp: stamp_line.to_string(),
            source,
        }),
    }
}

/// The input is not a v2 list at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No `## ` section marker was found
    #[error("invalid format for source [{source_name}]: no sections found")]
    NoSections {
        /// Source being parsed
        source_name: String,
    },

    /// A section has an empty name line
    #[error("invalid format for source [{source_name}]: section {index} has no name")]
    UnnamedSection {
        /// Source being parsed
        source_name: String,
        /// Zero-based section index
        index: usize,
    },
}

/// A single list entry that could not be registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// More than one `sdns:` line
    #[error("multiple stamps for server [{name}]")]
    MultipleStamps {
        /// Prefixed entry name
        name: String,
    },

    /// No usable `sdns:` line
    #[error("missing stamp for server [{name}]")]
    MissingStamp {
        /// Prefixed entry name
        name: String,
    },

    /// The `sdns:` line did not decode
    #[error("invalid or unsupported stamp [{stamp}] for server [{name}]: {source}")]
    InvalidStamp {
        /// Prefixed entry name
        name: String,
        /// Stamp line as written
        stamp: String,
        /// Decoding error
        source: StampError,
    },
}

impl EntryError {
    /// Name of the skipped entry
    pub fn name(&self) -> &str {
        match self {
            EntryError::MultipleStamps { name }
            | EntryError::MissingStamp { name }
            | EntryError::InvalidStamp { name, .. } => name,
        }
    }
}
