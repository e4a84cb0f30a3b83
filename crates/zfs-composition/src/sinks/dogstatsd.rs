// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! DogStatsD sink: one UDP datagram per gauge.
//!
//! The plugin identifier is the metric name, the pool and the metric label are
//! carried as tags:
//!
//! ```text
//! zfs_composition:500000|g|#plugin_instance:tank,type_instance:tank_data-usedbydataset
//! ```

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::emitter::{MetricEvent, ReportSink};
use crate::error::SinkError;

pub const DEFAULT_DOGSTATSD_HOST: &str = "127.0.0.1";
pub const DEFAULT_DOGSTATSD_PORT: u16 = 8125;

pub struct DogStatsDSink {
    socket: UdpSocket,
    destination: String,
}

impl DogStatsDSink {
    /// Binds an ephemeral local socket and connects it to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SinkError> {
        let destination = format!("{host}:{port}");
        let io_error = |source| SinkError::Io {
            destination: destination.clone(),
            source,
        };

        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(io_error)?;
        socket.connect((host, port)).await.map_err(io_error)?;
        debug!("DogStatsD sink sending to {destination}");

        Ok(Self {
            socket,
            destination,
        })
    }
}

/// Formats `event` as a DogStatsD gauge datagram.
pub fn format_gauge(event: &MetricEvent) -> String {
    format!(
        "{}:{}|g|#plugin_instance:{},type_instance:{}",
        event.plugin, event.value, event.plugin_instance, event.type_instance
    )
}

#[async_trait]
impl ReportSink for DogStatsDSink {
    async fn dispatch(&self, event: &MetricEvent) -> Result<(), SinkError> {
        let payload = format_gauge(event);
        self.socket
            .send(payload.as_bytes())
            .await
            .map(|_| ())
            .map_err(|source| SinkError::Io {
                destination: self.destination.clone(),
                source,
            })
    }
}
