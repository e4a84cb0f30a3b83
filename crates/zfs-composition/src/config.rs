// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CHECK_INTERVAL;
use crate::error::ConfigError;
use crate::hostname::get_hostname;
use crate::sampler::DEFAULT_ZFS_BIN;
use crate::sinks::dogstatsd::{DEFAULT_DOGSTATSD_HOST, DEFAULT_DOGSTATSD_PORT};

/// collectd's default read interval.
pub const DEFAULT_READ_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Where metric events are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// `PUTVAL` lines on stdout, for collectd's exec plugin
    Collectd,
    /// Gauges over UDP to a DogStatsD listener
    DogStatsD,
}

impl FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "collectd" => Ok(SinkKind::Collectd),
            "dogstatsd" => Ok(SinkKind::DogStatsD),
            other => Err(ConfigError::Invalid(format!(
                "Unknown sink '{other}'. Must be one of: collectd, dogstatsd"
            ))),
        }
    }
}

/// Configuration for the sampler, cache and sink
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum time between two real `zfs` invocations
    pub check_interval: Duration,
    /// Period at which the host polls
    pub read_interval: Duration,
    /// Upper bound for a single external command
    pub command_timeout: Duration,
    pub zfs_bin: String,
    pub sink: SinkKind,
    pub dogstatsd_host: String,
    pub dogstatsd_port: u16,
    /// Host part of the collectd identifier
    pub hostname: String,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            read_interval: DEFAULT_READ_INTERVAL,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            zfs_bin: DEFAULT_ZFS_BIN.to_string(),
            sink: SinkKind::Collectd,
            dogstatsd_host: DEFAULT_DOGSTATSD_HOST.to_string(),
            dogstatsd_port: DEFAULT_DOGSTATSD_PORT,
            hostname: "localhost".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// collectd exports its interval as a float, e.g. "10.000".
fn collectd_interval() -> Option<Duration> {
    env::var("COLLECTD_INTERVAL")
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let check_interval =
            env_secs("ZFS_COMPOSITION_CHECK_INTERVAL").unwrap_or(defaults.check_interval);
        let read_interval = env_secs("ZFS_COMPOSITION_READ_INTERVAL")
            .or_else(collectd_interval)
            .unwrap_or(defaults.read_interval);
        let command_timeout =
            env_secs("ZFS_COMPOSITION_COMMAND_TIMEOUT").unwrap_or(defaults.command_timeout);
        let zfs_bin = env::var("ZFS_COMPOSITION_ZFS_BIN").unwrap_or(defaults.zfs_bin);
        let sink = match env::var("ZFS_COMPOSITION_SINK") {
            Ok(val) => val.parse::<SinkKind>()?,
            Err(_) => defaults.sink,
        };
        let dogstatsd_host =
            env::var("ZFS_COMPOSITION_DOGSTATSD_HOST").unwrap_or(defaults.dogstatsd_host);
        let dogstatsd_port = env::var("ZFS_COMPOSITION_DOGSTATSD_PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(defaults.dogstatsd_port);
        let log_level = env::var("ZFS_COMPOSITION_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);

        let config = Self {
            check_interval,
            read_interval,
            command_timeout,
            zfs_bin,
            sink,
            dogstatsd_host,
            dogstatsd_port,
            hostname: get_hostname(),
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("check interval", self.check_interval),
            ("read interval", self.read_interval),
            ("command timeout", self.command_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.zfs_bin.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "zfs binary path cannot be empty".to_string(),
            ));
        }

        if self.sink == SinkKind::DogStatsD {
            if self.dogstatsd_port == 0 {
                return Err(ConfigError::Invalid(
                    "DogStatsD port must be greater than 0".to_string(),
                ));
            }
            if self.dogstatsd_host.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "DogStatsD host cannot be empty".to_string(),
                ));
            }
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "ZFS_COMPOSITION_CHECK_INTERVAL",
        "ZFS_COMPOSITION_READ_INTERVAL",
        "ZFS_COMPOSITION_COMMAND_TIMEOUT",
        "ZFS_COMPOSITION_ZFS_BIN",
        "ZFS_COMPOSITION_SINK",
        "ZFS_COMPOSITION_DOGSTATSD_HOST",
        "ZFS_COMPOSITION_DOGSTATSD_PORT",
        "ZFS_COMPOSITION_LOG_LEVEL",
        "COLLECTD_INTERVAL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.check_interval, Duration::from_secs(300));
        assert_eq!(config.sink, SinkKind::Collectd);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        assert_eq!(config.read_interval, DEFAULT_READ_INTERVAL);
        assert_eq!(config.command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert_eq!(config.zfs_bin, "/sbin/zfs");
        assert_eq!(config.dogstatsd_port, 8125);
        assert!(!config.hostname.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("ZFS_COMPOSITION_CHECK_INTERVAL", "60");
        env::set_var("ZFS_COMPOSITION_READ_INTERVAL", "5");
        env::set_var("ZFS_COMPOSITION_ZFS_BIN", "/usr/sbin/zfs");
        env::set_var("ZFS_COMPOSITION_SINK", "DogStatsD");
        env::set_var("ZFS_COMPOSITION_DOGSTATSD_PORT", "18125");
        env::set_var("ZFS_COMPOSITION_LOG_LEVEL", "DEBUG");

        let config = Config::from_env().unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.read_interval, Duration::from_secs(5));
        assert_eq!(config.zfs_bin, "/usr/sbin/zfs");
        assert_eq!(config.sink, SinkKind::DogStatsD);
        assert_eq!(config.dogstatsd_port, 18125);
        assert_eq!(config.log_level, "debug");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_collectd_interval_is_honoured() {
        clear_env();
        env::set_var("COLLECTD_INTERVAL", "20.000");
        let config = Config::from_env().unwrap();
        assert_eq!(config.read_interval, Duration::from_secs(20));

        env::set_var("ZFS_COMPOSITION_READ_INTERVAL", "3");
        let config = Config::from_env().unwrap();
        assert_eq!(config.read_interval, Duration::from_secs(3));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_sub_second_collectd_interval() {
        clear_env();
        env::set_var("COLLECTD_INTERVAL", "0.5");
        let config = Config::from_env().unwrap();
        assert_eq!(config.read_interval, Duration::from_millis(500));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_number_falls_back_to_default() {
        clear_env();
        env::set_var("ZFS_COMPOSITION_CHECK_INTERVAL", "five minutes");
        let config = Config::from_env().unwrap();
        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_check_interval_is_rejected() {
        clear_env();
        env::set_var("ZFS_COMPOSITION_CHECK_INTERVAL", "0");
        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: check interval must be greater than 0"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_sink_is_rejected() {
        clear_env();
        env::set_var("ZFS_COMPOSITION_SINK", "graphite");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_binary() {
        let config = Config {
            zfs_bin: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_dogstatsd_port_only_checked_for_dogstatsd() {
        let config = Config {
            dogstatsd_port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            sink: SinkKind::DogStatsD,
            dogstatsd_port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
