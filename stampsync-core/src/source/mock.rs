// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! In-memory implementation of the Transport trait for testing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::fetcher::{FetchError, Transport};

/// Mock transport for testing.
///
/// Serves canned bodies per URL and records every requested URL.
/// Unknown URLs answer with HTTP 404.
///
/// # Example
///
/// ```ignore
/// let transport = MockTransport::new();
/// transport.serve("https://example.org/list.md", list);
/// transport.serve("https://example.org/list.md.minisig", signature);
///
/// // ... run a source against it ...
/// assert_eq!(transport.request_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Result<Vec<u8>, u16>>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Creates a new mock transport with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        lock(&self.responses).insert(url.to_string(), Ok(body.into()));
    }

    /// Answers `url` with the given HTTP status.
    pub fn fail(&self, url: &str, status: u16) {
        lock(&self.responses).insert(url.to_string(), Err(status));
    }

    /// Returns all URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// Returns the number of requests so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Clears the request log.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url, _timeout: Duration, max_len: u64) -> Result<Vec<u8>, FetchError> {
        lock(&self.requests).push(url.to_string());

        match lock(&self.responses).get(url.as_str()) {
            Some(Ok(body)) if body.len() as u64 > max_len => Err(FetchError::TooLarge {
                size: body.len() as u64,
                max: max_len,
            }),
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Http(*status)),
            None => Err(FetchError::Http(404)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
