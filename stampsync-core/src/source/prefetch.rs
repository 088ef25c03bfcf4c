// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Prefetch sweep over a set of sources

use std::time::{Duration, SystemTime};

use futures_util::future::join_all;
use tracing::debug;

use super::config::MINIMUM_PREFETCH_INTERVAL;
use super::controller::Source;
use super::fetcher::Transport;

/// Refresh every source that is due at `now`
///
/// Due sources are refreshed concurrently. Returns how long the caller
/// should wait before the next sweep: the shortest successful refresh
/// delay that is at least [`MINIMUM_PREFETCH_INTERVAL`], or that interval
/// itself. This function never sleeps; driving the sweeps is up to the
/// caller, who must also not start a sweep while the previous one is
/// still running.
pub async fn prefetch_sources<T: Transport + ?Sized>(
    transport: &T,
    sources: &mut [Source],
    now: SystemTime,
) -> Duration {
    let refreshes = sources
        .iter_mut()
        .filter(|source| source.refresh_due(now))
        .map(|source| async move {
            debug!(source = %source.name(), "Prefetching");
            match source.resolve(transport, now).await {
                Ok(delay) => {
                    debug!(source = %source.name(), next_update = ?delay, "Prefetching succeeded");
                    Some(delay)
                }
                Err(error) => {
                    debug!(source = %source.name(), %error, "Prefetching failed");
                    None
                }
            }
        });

    join_all(refreshes)
        .await
        .into_iter()
        .flatten()
        .filter(|delay| *delay >= MINIMUM_PREFETCH_INTERVAL)
        .min()
        .unwrap_or(MINIMUM_PREFETCH_INTERVAL)
}
