// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname detection for the collectd identifier

use std::env;
use tracing::warn;

/// Get the hostname metrics are reported under
///
/// This function tries multiple methods to determine the hostname:
/// 1. COLLECTD_HOSTNAME environment variable (set by collectd's exec plugin)
/// 2. HOSTNAME environment variable
/// 3. System hostname via nix::unistd::gethostname()
/// 4. Fallback to "localhost" if all methods fail
#[must_use]
pub fn get_hostname() -> String {
    for var in ["COLLECTD_HOSTNAME", "HOSTNAME"] {
        if let Ok(hostname) = env::var(var) {
            if !hostname.is_empty() {
                return hostname;
            }
        }
    }

    match nix::unistd::gethostname() {
        Ok(hostname_osstr) => {
            if let Some(hostname_str) = hostname_osstr.to_str() {
                if !hostname_str.is_empty() {
                    return hostname_str.to_string();
                }
            }
        }
        Err(e) => {
            warn!("Failed to get system hostname: {}", e);
        }
    }

    warn!("Could not determine hostname, using 'localhost'");
    "localhost".to_string()
}
