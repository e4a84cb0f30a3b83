// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns readings into gauge events and hands them to the reporting sink.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::correlator::ReportTriple;
use crate::error::SinkError;

/// Identifier the events are reported under.
pub const PLUGIN_NAME: &str = "zfs_composition";
pub const GAUGE: &str = "gauge";

/// Replaces every `/` with `_`; the sinks use flat identifiers.
pub fn sanitize(identifier: &str) -> String {
    identifier.replace('/', "_")
}

/// A single gauge reading in the shape the monitoring daemon expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricEvent {
    pub metric_type: &'static str,
    pub plugin: &'static str,
    pub plugin_instance: String,
    pub type_instance: String,
    pub value: u64,
}

impl From<&ReportTriple> for MetricEvent {
    fn from(triple: &ReportTriple) -> Self {
        Self {
            metric_type: GAUGE,
            plugin: PLUGIN_NAME,
            plugin_instance: sanitize(&triple.entity_name),
            type_instance: sanitize(&triple.metric_label),
            value: triple.value_bytes,
        }
    }
}

/// Destination of metric events.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn dispatch(&self, event: &MetricEvent) -> Result<(), SinkError>;
}

#[derive(Clone)]
pub struct MetricEmitter {
    sink: Arc<dyn ReportSink>,
}

impl MetricEmitter {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Sanitizes and dispatches one reading. Sink errors are returned as is.
    pub async fn emit(&self, triple: &ReportTriple) -> Result<(), SinkError> {
        let event = MetricEvent::from(triple);
        debug!(
            "{PLUGIN_NAME}: Reading data: {} / {} = {}",
            triple.entity_name, triple.metric_label, triple.value_bytes
        );
        self.sink.dispatch(&event).await
    }

    /// Emits every reading in order, stopping at the first sink failure.
    /// Returns the number of events delivered.
    pub async fn emit_all(&self, triples: &[ReportTriple]) -> Result<usize, SinkError> {
        for triple in triples {
            self.emit(triple).await?;
        }
        Ok(triples.len())
    }
}
