// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Poll entry point invoked by the host on every tick.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::SampleCache;
use crate::correlator::correlate;
use crate::emitter::MetricEmitter;
use crate::error::PollError;
use crate::sampler::ZfsSampler;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Reads the tokio clock, which tests can pause and advance.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub struct Poller {
    sampler: ZfsSampler,
    cache: Mutex<SampleCache>,
    emitter: MetricEmitter,
    clock: Arc<dyn Clock>,
}

impl Poller {
    pub fn new(
        sampler: ZfsSampler,
        cache: SampleCache,
        emitter: MetricEmitter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sampler,
            cache: Mutex::new(cache),
            emitter,
            clock,
        }
    }

    /// Runs one poll cycle and returns the number of events emitted.
    ///
    /// The cache lock is held for the whole cycle, so concurrent callers are
    /// serialized and at most one refresh is in flight.
    pub async fn poll(&self) -> Result<usize, PollError> {
        let mut cache = self.cache.lock().await;
        let now = self.clock.now();

        let sample = cache
            .maybe_refresh(now, || self.sampler.fetch(now))
            .await?;
        let triples = correlate(&sample);
        let emitted = self.emitter.emit_all(&triples).await?;

        debug!("Poll cycle emitted {emitted} metrics");
        Ok(emitted)
    }

    /// Whether at least one fetch has succeeded.
    pub async fn is_warm(&self) -> bool {
        self.cache.lock().await.is_warm()
    }
}
