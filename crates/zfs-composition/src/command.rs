// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Execution of the external `zfs` queries.
//!
//! Commands are always built as an explicit program plus argument vector and
//! are never passed through a shell. Standard output is captured in full while
//! the child runs, and the exit status is only inspected once the output has
//! been drained.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExecutionError;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion and returns its standard output, one entry
    /// per line.
    async fn run(&self, command: &CommandLine) -> Result<Vec<String>, ExecutionError>;
}

/// Runs commands as child processes on the tokio runtime.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<Vec<String>, ExecutionError> {
        let rendered = command.to_string();
        debug!("Executing {rendered}");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the output future on timeout must not leave the child behind
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ExecutionError::Spawn {
                    command: rendered,
                    source,
                })
            }
            Err(_) => {
                return Err(ExecutionError::Timeout {
                    command: rendered,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{rendered} failed: {}", stderr.trim());
            return Err(ExecutionError::NonZeroExit {
                command: rendered,
                exit_code: output.status.code(),
            });
        }

        let stdout =
            String::from_utf8(output.stdout).map_err(|_| ExecutionError::Decode {
                command: rendered.clone(),
            })?;
        let lines: Vec<String> = stdout.lines().map(str::to_owned).collect();
        debug!("{rendered} returned {} lines", lines.len());
        Ok(lines)
    }
}
