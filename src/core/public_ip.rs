//! Public IP lookup with TTL and single-flight gating.
//!
//! The gate is a pure function over explicit state (`last_fetch`,
//! `in_flight`) owned by the engine; the fetch itself shells out to `curl`
//! against a list of IP echo endpoints and runs on a worker thread. Failures
//! are silent: the cached value is retained and the next eligible tick
//! retries naturally.

use std::process::Command;
use std::time::{Duration, Instant};

use crate::log_debug;
use crate::utils::looks_like_ipv4;

/// Whether a new lookup may be issued now.
///
/// Exactly one condition set opens the gate: no fetch in flight, and either
/// no lookup has ever succeeded or the TTL has fully elapsed since the last
/// success.
#[must_use]
pub fn should_fetch(
    now: Instant,
    last_fetch: Option<Instant>,
    ttl: Duration,
    in_flight: bool,
) -> bool {
    if in_flight {
        return false;
    }
    last_fetch.map_or(true, |t| now.saturating_duration_since(t) >= ttl)
}

/// Fetch the externally-visible address, trying each endpoint in order.
///
/// A response body is accepted only if it trims to a dotted-quad literal;
/// HTML error pages and empty bodies fall through to the next endpoint.
/// Returns `None` when every endpoint fails -- the caller keeps its cache.
#[must_use]
pub fn fetch_public_ip(endpoints: &[String], timeout_secs: u64) -> Option<String> {
    let timeout = timeout_secs.to_string();

    for endpoint in endpoints {
        let output = Command::new("curl")
            .args(["-s", "--max-time", &timeout, endpoint])
            .output();

        let Ok(output) = output else {
            log_debug!("NETINFO", "curl launch failed for {endpoint}");
            continue;
        };
        if !output.status.success() {
            continue;
        }

        let body = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if looks_like_ipv4(&body) {
            return Some(body);
        }
        log_debug!("NETINFO", "{endpoint} returned a non-address body");
    }

    None
}
