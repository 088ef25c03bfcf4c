// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local cache for a source list and its detached signature
//!
//! The cache is a pair of sibling files: the list at the configured path
//! and its signature at the same path plus `.minisig`. Both are plain byte
//! streams. Writes are atomic per file (write to a unique temp file, then
//! rename) and both temp files are fully written before either is renamed
//! into place, so concurrent writers never share a temp file.
//! Nothing read from here is trusted until its signature verifies.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use thiserror::Error;

use super::config::SIGNATURE_SUFFIX;
use super::integrity::SignatureError;

/// Cached list + signature pair of one source
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    signature_path: PathBuf,
}

impl CacheStore {
    /// Create a cache store for the list at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let signature_path = signature_path(&path);
        Self {
            path,
            signature_path,
        }
    }

    /// Path of the cached list
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the cached signature
    pub fn signature_path(&self) -> &Path {
        &self.signature_path
    }

    /// Read the cached list and signature
    ///
    /// If either file is missing the whole pair counts as missing.
    pub fn load(&self) -> Result<(Vec<u8>, Vec<u8>), CacheError> {
        let blob = read(&self.path)?;
        let signature = read(&self.signature_path)?;
        Ok((blob, signature))
    }

    /// Time elapsed between the last write of the cached list and `now`
    ///
    /// A modification time in the future counts as zero elapsed time.
    pub fn age(&self, now: SystemTime) -> Result<Duration, CacheError> {
        let modified = fs::metadata(&self.path)?.modified()?;
        Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
    }

    /// Replace the cached pair
    ///
    /// Both files are staged under unique temp names in the cache directory
    /// and synced before the first rename, so a failure while writing either
    /// one leaves the previous pair intact. Temp files never outlive a call.
    pub fn store(&self, blob: &[u8], signature: &[u8]) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let blob_temp = stage(dir, blob)?;
        let signature_temp = stage(dir, signature)?;

        blob_temp.persist(&self.path).map_err(|err| err.error)?;
        signature_temp
            .persist(&self.signature_path)
            .map_err(|err| err.error)?;
        Ok(())
    }
}

/// Derive the detached signature path of a cached list
pub fn signature_path(path: &Path) -> PathBuf {
    append_to_path(path, SIGNATURE_SUFFIX)
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn read(path: &Path) -> Result<Vec<u8>, CacheError> {
    fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => CacheError::NotFound(path.to_path_buf()),
        _ => CacheError::Io(err),
    })
}

/// Write `data` to a fresh temp file in `dir` and sync it
///
/// The temp file is removed when dropped without being persisted.
fn stage(dir: &Path, data: &[u8]) -> Result<NamedTempFile, CacheError> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Errors that can occur with the source cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// One of the two cache files does not exist
    #[error("cache file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Cached signature did not verify
    #[error("cached signature rejected: {0}")]
    Untrusted(#[from] SignatureError),
}
