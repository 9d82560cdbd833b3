//! Status output parser.
//!
//! Turns the raw text block printed by the status command into a
//! [`StatusSnapshot`]. Pure and deterministic: identical input always yields
//! an identical snapshot, and malformed input degrades to absent fields or
//! `Unknown` rather than an error.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::state::{StatusSnapshot, VpnState};
use crate::utils::looks_like_ipv4;

/// Parse one service's status output.
///
/// The first line, whitespace-trimmed, is the authoritative state token.
/// For `Disconnected` and unrecognized states the rest of the text is not
/// scanned -- every derived field is cleared. Otherwise the remaining lines
/// are scanned, order-independently, for the interface name, the first
/// tunnel address, and the last status-change time.
#[must_use]
pub fn parse_status(raw: &str) -> StatusSnapshot {
    let mut lines = raw.lines();

    let state = match lines.next().map(str::trim) {
        Some("Connected") => VpnState::Connected,
        Some("Disconnected") => return disconnected(),
        Some("Connecting") => VpnState::Connecting,
        Some("Disconnecting") => VpnState::Disconnecting,
        _ => return StatusSnapshot::unknown(),
    };

    let mut snapshot = StatusSnapshot {
        state,
        ..StatusSnapshot::default()
    };

    // The address block spans two lines:
    //   Addresses : <array> {
    //     0 : 100.64.100.2
    // Only the line immediately after the header is considered; a closing
    // brace or any non-entry line ends the block scan with no address.
    let mut in_addresses = false;
    for line in lines {
        let trimmed = line.trim();

        if in_addresses {
            in_addresses = false;
            if snapshot.tunnel_ip.is_none() {
                snapshot.tunnel_ip = address_entry(trimmed);
            }
        }

        if trimmed.starts_with("Addresses : <array>") {
            in_addresses = true;
            continue;
        }

        if let Some(value) = trimmed.strip_prefix("InterfaceName : ") {
            snapshot.interface = Some(value.trim().to_string());
        }

        if trimmed.starts_with("LastStatusChangeTime") {
            if let Some((_, value)) = trimmed.split_once(" : ") {
                snapshot.since = parse_change_time(value.trim());
            }
        }
    }

    snapshot
}

fn disconnected() -> StatusSnapshot {
    StatusSnapshot {
        state: VpnState::Disconnected,
        ..StatusSnapshot::default()
    }
}

/// A tunnel address from an address-block line.
///
/// Accepts the indexed form `0 : 100.64.100.2` and, more permissively, a
/// bare dotted-quad line.
fn address_entry(line: &str) -> Option<String> {
    if looks_like_ipv4(line) {
        return Some(line.to_string());
    }
    let (index, value) = line.split_once(" : ")?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value = value.trim();
    looks_like_ipv4(value).then(|| value.to_string())
}

/// Parse the status-change timestamp.
///
/// The status command prints `MM/DD/YYYY HH:MM:SS` in the POSIX locale;
/// some variants emit an ISO-like `YYYY-MM-DD HH:MM:SS ±HHMM` instead.
/// The first format that parses wins; if neither parses the field stays
/// absent and the connection state is unaffected.
fn parse_change_time(value: &str) -> Option<DateTime<Local>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%m/%d/%Y %H:%M:%S") {
        return Local.from_local_datetime(&naive).earliest();
    }
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CONNECTED_OUTPUT: &str = r"Connected

Extended Status <dictionary> {
  IPv4 : <dictionary> {
    Addresses : <array> {
      0 : 100.64.100.2
    }
    InterfaceName : utun4
  }
  Status : <dictionary> {
    LastStatusChangeTime : 02/24/2026 17:00:00
  }
}
";

    #[test]
    fn test_connected_full_output() {
        let snap = parse_status(CONNECTED_OUTPUT);
        assert_eq!(snap.state, VpnState::Connected);
        assert_eq!(snap.tunnel_ip.as_deref(), Some("100.64.100.2"));
        assert_eq!(snap.interface.as_deref(), Some("utun4"));
        let expected = Local.with_ymd_and_hms(2026, 2, 24, 17, 0, 0).unwrap();
        assert_eq!(snap.since, Some(expected));
    }

    #[test]
    fn test_disconnected_short_circuits() {
        // Trailing content must not be scanned: even a stale address block
        // after a Disconnected token leaves all derived fields cleared.
        let raw = r"Disconnected
Addresses : <array> {
  0 : 10.0.0.5
}
LastStatusChangeTime : 02/24/2026 17:00:00
";
        let snap = parse_status(raw);
        assert_eq!(snap.state, VpnState::Disconnected);
        assert_eq!(snap.tunnel_ip, None);
        assert_eq!(snap.interface, None);
        assert_eq!(snap.since, None);
    }

    #[test]
    fn test_unrecognized_token_is_unknown() {
        for raw in ["Banana\n", "connected\n", " \n", "", "No service\n0 : 1.2.3.4\n"] {
            let snap = parse_status(raw);
            assert_eq!(snap.state, VpnState::Unknown, "input: {raw:?}");
            assert_eq!(snap.tunnel_ip, None);
            assert_eq!(snap.interface, None);
            assert_eq!(snap.since, None);
        }
    }

    #[test]
    fn test_state_token_is_trimmed() {
        let snap = parse_status("  Connected  \n");
        assert_eq!(snap.state, VpnState::Connected);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let a = parse_status(CONNECTED_OUTPUT);
        let b = parse_status(CONNECTED_OUTPUT);
        assert_eq!(a, b);
    }

    #[test]
    fn test_address_block_round_trip() {
        let raw = "Connected\nAddresses : <array> {\n 0 : 10.1.2.3\n}\n";
        assert_eq!(parse_status(raw).tunnel_ip.as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_address_block_bare_ip_line() {
        let raw = "Connected\nAddresses : <array> {\n  10.8.0.6\n}\n";
        assert_eq!(parse_status(raw).tunnel_ip.as_deref(), Some("10.8.0.6"));
    }

    #[test]
    fn test_address_block_empty() {
        let raw = "Connected\nAddresses : <array> {\n}\n";
        assert_eq!(parse_status(raw).tunnel_ip, None);
    }

    #[test]
    fn test_address_block_malformed_entry() {
        let raw = "Connected\nAddresses : <array> {\n  0 : not-an-ip\n}\n";
        assert_eq!(parse_status(raw).tunnel_ip, None);
    }

    #[test]
    fn test_address_block_truncated_at_header() {
        // Header as the last line: nothing to scan, nothing to fail on.
        let raw = "Connected\nAddresses : <array> {";
        let snap = parse_status(raw);
        assert_eq!(snap.state, VpnState::Connected);
        assert_eq!(snap.tunnel_ip, None);
    }

    #[test]
    fn test_fields_parsed_for_transitional_states() {
        // The parser reports what the text carries even mid-transition;
        // publication policy lives in the engine.
        let raw = "Disconnecting\nAddresses : <array> {\n 0 : 10.1.2.3\n}\nInterfaceName : utun7\n";
        let snap = parse_status(raw);
        assert_eq!(snap.state, VpnState::Disconnecting);
        assert_eq!(snap.tunnel_ip.as_deref(), Some("10.1.2.3"));
        assert_eq!(snap.interface.as_deref(), Some("utun7"));
    }

    #[test]
    fn test_timestamp_posix_format_wins() {
        let raw = "Connected\nLastStatusChangeTime : 02/24/2026 17:00:00\n";
        let expected = Local.with_ymd_and_hms(2026, 2, 24, 17, 0, 0).unwrap();
        assert_eq!(parse_status(raw).since, Some(expected));
    }

    #[test]
    fn test_timestamp_iso_fallback() {
        let raw = "Connected\nLastStatusChangeTime : 2026-02-24 17:00:00 +0000\n";
        let snap = parse_status(raw);
        let expected = chrono::Utc
            .with_ymd_and_hms(2026, 2, 24, 17, 0, 0)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(snap.since, Some(expected));
    }

    #[test]
    fn test_timestamp_unparsable_leaves_state_intact() {
        let raw = "Connected\nLastStatusChangeTime : tomorrow-ish\n";
        let snap = parse_status(raw);
        assert_eq!(snap.state, VpnState::Connected);
        assert_eq!(snap.since, None);
    }

    #[test]
    fn test_interface_name_alone() {
        let raw = "Connecting\nInterfaceName : utun2\n";
        let snap = parse_status(raw);
        assert_eq!(snap.state, VpnState::Connecting);
        assert_eq!(snap.interface.as_deref(), Some("utun2"));
        assert_eq!(snap.tunnel_ip, None);
    }

    #[test]
    fn test_blocks_are_order_independent() {
        let raw = r"Connected
LastStatusChangeTime : 02/24/2026 09:30:00
InterfaceName : utun4
Addresses : <array> {
  0 : 100.64.100.2
}
";
        let snap = parse_status(raw);
        assert_eq!(snap.tunnel_ip.as_deref(), Some("100.64.100.2"));
        assert_eq!(snap.interface.as_deref(), Some("utun4"));
        assert!(snap.since.is_some());
    }
}
