// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of the poll cycle's collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use zfs_composition::command::{CommandLine, CommandRunner};
use zfs_composition::emitter::{MetricEvent, ReportSink};
use zfs_composition::error::{ExecutionError, SinkError};
use zfs_composition::poller::Clock;
use zfs_composition::sampler::{dataset_usage_query, pool_free_query};

pub const ZFS: &str = "zfs";

pub fn pool_query() -> String {
    pool_free_query(ZFS).to_string()
}

pub fn dataset_query() -> String {
    dataset_usage_query(ZFS).to_string()
}

/// Command runner serving canned output per rendered command line
#[derive(Default)]
pub struct MockRunner {
    outputs: Mutex<HashMap<String, Result<Vec<String>, i32>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockRunner {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn set_output(&self, command: &str, lines: &[&str]) {
        self.outputs.lock().unwrap().insert(
            command.to_string(),
            Ok(lines.iter().map(|line| line.to_string()).collect()),
        );
    }

    pub fn set_failure(&self, command: &str, exit_code: i32) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), Err(exit_code));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &CommandLine) -> Result<Vec<String>, ExecutionError> {
        let rendered = command.to_string();
        self.calls.lock().unwrap().push(rendered.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let output = self.outputs.lock().unwrap().get(&rendered).cloned();
        match output {
            Some(Ok(lines)) => Ok(lines),
            Some(Err(code)) => Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                exit_code: Some(code),
            }),
            None => Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                exit_code: Some(127),
            }),
        }
    }
}

/// Sink keeping every event it receives
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MetricEvent>>,
    unreachable: AtomicBool,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Returns and clears the events received so far
    pub fn take_events(&self) -> Vec<MetricEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl ReportSink for RecordingSink {
    async fn dispatch(&self, event: &MetricEvent) -> Result<(), SinkError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SinkError::Io {
                destination: "recording sink".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "unreachable"),
            });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<Instant>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
