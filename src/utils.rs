//! Small shared helpers: address-shape checks and time formatting.

use chrono::{DateTime, Local};

/// Whether a string looks like a dotted IPv4 address.
///
/// Shape check only: status output and IP echo services hand back plain
/// dotted quads; anything else (HTML error pages, empty bodies, v6
/// literals) is rejected.
#[must_use]
pub fn looks_like_ipv4(s: &str) -> bool {
    let mut octets = 0;
    for part in s.split('.') {
        if part.is_empty() || part.len() > 3 || !part.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if part.parse::<u16>().map_or(true, |v| v > 255) {
            return false;
        }
        octets += 1;
    }
    octets == 4
}

/// Format a timestamp as `HH:MM:SS` local time for log lines.
#[must_use]
pub fn format_system_time_local(t: std::time::SystemTime) -> String {
    let dt: DateTime<Local> = t.into();
    dt.format("%H:%M:%S").to_string()
}

/// Human-readable elapsed time since `since`, e.g. "2h 15m" or "4m".
///
/// Sub-minute uptimes render as "0m"; a `since` in the future renders the
/// same way rather than going negative.
#[must_use]
pub fn format_duration_since(since: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - since).num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
