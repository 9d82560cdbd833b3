//! Application-wide constants and default configuration values.
//!
//! This module defines all static configuration values used throughout
//! tunnelwatch, including timing intervals, the system command invoked for
//! status queries, and public-IP echo endpoints.

#![allow(dead_code)]
use std::time::Duration;

// === Application Metadata ===

/// Application name (from Cargo.toml).
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
/// Current application version (from Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// === System Commands ===

/// Absolute path to the network-configuration utility queried for VPN
/// service status (`--nc status|start|stop|list`).
pub const SCUTIL_PATH: &str = "/usr/sbin/scutil";

// === Timing Configuration ===

/// Fallback status poll interval in seconds. Safety net for the case where
/// path-change detection misses a transition.
pub const DEFAULT_STATUS_POLL_SECS: u64 = 3;
/// Interval between interface-table probes feeding path-change detection.
pub const DEFAULT_PATH_PROBE_MS: u64 = 1000;
/// Wait after issuing a connect/disconnect command before re-observing
/// state, so the system has time to begin the transition.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
/// Disconnect-enforcer tick period. Bounds how long an unwanted
/// auto-reconnect can stay up before being re-stopped.
pub const DEFAULT_GUARD_TICK_MS: u64 = 500;
/// Minimum interval between outbound public-IP lookups.
pub const DEFAULT_PUBLIC_IP_TTL_SECS: u64 = 30;
/// Upper bound on a single status/list command invocation.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;
/// Timeout for public-IP HTTP calls in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 5;

/// Interval between published-state reads in `watch` mode.
pub const WATCH_REFRESH: Duration = Duration::from_millis(300);

// === Public IP Echo Endpoints ===

/// IP echo endpoints, tried in order. Each returns the caller's public
/// address as a bare text body.
pub const DEFAULT_IP_ECHO_APIS: [&str; 3] = [
    "https://api.ipify.org",
    "https://icanhazip.com",
    "https://ifconfig.me/ip",
];

// === Logging ===

/// Default minimum log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default maximum number of log entries kept in memory.
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 1000;

// === CLI Output ===

/// Placeholder for values not currently known.
pub const MSG_NO_DATA: &str = "---";
