//! The published status surface read by presentation code.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::connection::VpnState;
use super::host::HostNetworkInfo;

/// Everything a presentation layer may read about the monitored service.
///
/// Published wholesale by the monitor engine after each applied check; the
/// only field external callers influence directly is the service name, via
/// [`crate::core::monitor::Monitor::set_service`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Name of the VPN service being monitored.
    pub service: String,
    /// Current connection state.
    pub state: VpnState,
    /// Tunnel-internal address. Published only while `Connected`.
    pub tunnel_ip: Option<String>,
    /// Interface carrying the tunnel.
    pub interface: Option<String>,
    /// When the connection entered its current status, per the source.
    pub since: Option<DateTime<Local>>,
    /// Host addresses (local interface + cached public).
    #[serde(flatten)]
    pub host: HostNetworkInfo,
    /// The user's last explicit connect/disconnect instruction.
    pub wants_connected: bool,
}
