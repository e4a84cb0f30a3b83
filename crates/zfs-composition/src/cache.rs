// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Throttling cache in front of the ZFS queries.
//!
//! Some systems cannot cope with `zfs` being invoked on every read, so
//! a real fetch happens at most once per check interval. Reads in between are
//! served from the last successful sample.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ExecutionError;
use crate::sample::MetricSample;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct SampleCache {
    check_interval: Duration,
    last_fetch: Option<Instant>,
    data: Option<Arc<MetricSample>>,
}

impl SampleCache {
    pub fn new(check_interval: Duration) -> Self {
        Self {
            check_interval,
            last_fetch: None,
            data: None,
        }
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Time of the last successful fetch, `None` while the cache is cold.
    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch
    }

    pub fn is_warm(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<Arc<MetricSample>> {
        self.data.clone()
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_fetch {
            Some(last_fetch) => now.saturating_duration_since(last_fetch) >= self.check_interval,
            None => true,
        }
    }

    /// Returns the cached sample, calling `fetch` first if the cache is cold or
    /// the check interval has elapsed since the last successful fetch.
    ///
    /// A failed fetch leaves `last_fetch` untouched so the next call retries.
    /// The previous sample is served in that case; without one the error is
    /// returned.
    pub async fn maybe_refresh<F, Fut>(
        &mut self,
        now: Instant,
        fetch: F,
    ) -> Result<Arc<MetricSample>, ExecutionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MetricSample, ExecutionError>>,
    {
        if let (Some(sample), false) = (&self.data, self.is_due(now)) {
            return Ok(Arc::clone(sample));
        }

        debug!("Sample cache is stale, fetching new data");
        match fetch().await {
            Ok(sample) => {
                let sample = Arc::new(sample);
                self.data = Some(Arc::clone(&sample));
                self.last_fetch = Some(now);
                Ok(sample)
            }
            Err(e) => match &self.data {
                Some(previous) => {
                    warn!("Refreshing ZFS data failed, reusing previous sample: {e}");
                    Ok(Arc::clone(previous))
                }
                None => Err(e),
            },
        }
    }
}

impl Default for SampleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_INTERVAL)
    }
}
