//! Host-side network address state, independent of the VPN connection.

use serde::{Deserialize, Serialize};

/// The host's own addresses as last observed.
///
/// `public_ip` is sticky: a failed lookup never clears a previously
/// observed value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostNetworkInfo {
    /// Primary outbound-capable, non-loopback IPv4 address.
    pub local_ip: Option<String>,
    /// Last successfully observed externally-visible address.
    pub public_ip: Option<String>,
}
