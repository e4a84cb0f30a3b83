// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! collectd exec plugin sink.
//!
//! collectd's `exec` plugin reads `PUTVAL` commands from the standard output
//! of the processes it spawns, one per line:
//!
//! ```text
//! PUTVAL "myhost/zfs_composition-tank/gauge-tank_data-usedbydataset" interval=10 N:500000
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::emitter::{MetricEvent, ReportSink};
use crate::error::SinkError;

/// Writes events as collectd `PUTVAL` lines.
pub struct CollectdSink<W> {
    hostname: String,
    interval: Duration,
    writer: Mutex<W>,
}

impl CollectdSink<Stdout> {
    pub fn stdout(hostname: impl Into<String>, interval: Duration) -> Self {
        Self::new(hostname, interval, tokio::io::stdout())
    }
}

impl<W> CollectdSink<W> {
    pub fn new(hostname: impl Into<String>, interval: Duration, writer: W) -> Self {
        Self {
            hostname: hostname.into(),
            interval,
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Quotes an identifier, escaping the characters collectd treats specially
/// inside a quoted string.
fn quote(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push('"');
    for ch in identifier.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Formats `event` as a newline-terminated `PUTVAL` command.
///
/// collectd takes the interval in (possibly fractional) seconds.
pub fn format_putval(event: &MetricEvent, hostname: &str, interval: Duration) -> String {
    let identifier = format!(
        "{hostname}/{}-{}/{}-{}",
        event.plugin, event.plugin_instance, event.metric_type, event.type_instance
    );
    format!(
        "PUTVAL {} interval={} N:{}\n",
        quote(&identifier),
        interval.as_secs_f64(),
        event.value
    )
}

#[async_trait]
impl<W> ReportSink for CollectdSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn dispatch(&self, event: &MetricEvent) -> Result<(), SinkError> {
        let line = format_putval(event, &self.hostname, self.interval);
        let mut writer = self.writer.lock().await;
        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        result.map_err(|source| SinkError::Io {
            destination: "collectd exec stdout".to_string(),
            source,
        })
    }
}
