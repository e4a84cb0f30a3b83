// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for each stage of a poll cycle.

use std::time::Duration;

/// An external command could not produce usable output.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` produced output that is not valid UTF-8")]
    Decode { command: String },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ExecutionError {
    /// The rendered command line that failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. }
            | Self::NonZeroExit { command, .. }
            | Self::Timeout { command, .. }
            | Self::Decode { command } => command,
        }
    }
}

/// A single row of command output does not fit its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} tab-separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("value '{value}' for '{name}' is not a byte count")]
    InvalidValue { name: String, value: String },

    #[error("unknown property '{property}' for '{name}'")]
    UnknownProperty { name: String, property: String },
}

/// The reporting destination rejected an event or could not be reached.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to deliver metric to {destination}: {source}")]
    Io {
        destination: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a whole poll cycle, surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
