//! VPN connection state types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// VPN connection state machine.
///
/// Owned exclusively by the monitor engine and overwritten wholesale on every
/// successful parse of fresh status output. Transitions are never inferred
/// locally; the status command is the source of truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VpnState {
    /// Tunnel is up and carrying traffic.
    Connected,
    /// No active tunnel.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Teardown in progress.
    Disconnecting,
    /// Status could not be determined (unrecognized or empty output).
    #[default]
    Unknown,
}

impl VpnState {
    /// True for `Connected` and `Connecting` -- the states the disconnect
    /// enforcer must fight while the user wants to stay down.
    #[must_use]
    pub const fn is_up_or_coming_up(self) -> bool {
        matches!(self, Self::Connected | Self::Connecting)
    }
}

impl std::fmt::Display for VpnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Disconnecting => "Disconnecting",
            Self::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// One parsed status snapshot, produced per check cycle.
///
/// Invariant: when `state` is `Disconnected` or `Unknown`, all derived fields
/// are `None` -- never stale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Connection state parsed from the first line of status output.
    pub state: VpnState,
    /// Address assigned to the host inside the tunnel, when reported.
    pub tunnel_ip: Option<String>,
    /// System interface carrying the tunnel (e.g. utun4).
    pub interface: Option<String>,
    /// Wall-clock time of the last status change, as reported by the
    /// source -- not locally measured.
    pub since: Option<DateTime<Local>>,
}

impl StatusSnapshot {
    /// Snapshot for unparseable or empty status output.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_unknown() {
        assert_eq!(VpnState::default(), VpnState::Unknown);
        assert_eq!(StatusSnapshot::default().state, VpnState::Unknown);
    }

    #[test]
    fn test_up_or_coming_up() {
        assert!(VpnState::Connected.is_up_or_coming_up());
        assert!(VpnState::Connecting.is_up_or_coming_up());
        assert!(!VpnState::Disconnected.is_up_or_coming_up());
        assert!(!VpnState::Disconnecting.is_up_or_coming_up());
        assert!(!VpnState::Unknown.is_up_or_coming_up());
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&VpnState::Connected).unwrap();
        assert_eq!(json, "\"connected\"");
    }
}
