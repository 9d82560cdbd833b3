//! Host interface enumeration.
//!
//! One `getifaddrs` walk per call. Used two ways: resolving the host's
//! primary local IPv4 address, and producing a cheap signature of the
//! interface table so the engine can detect network path changes without a
//! dedicated OS observer.

#[cfg(unix)]
use std::ffi::CStr;
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;

/// One IPv4 interface entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IfEntry {
    name: String,
    ip: Ipv4Addr,
    up: bool,
    loopback: bool,
    point_to_point: bool,
}

impl IfEntry {
    /// Whether this entry can serve as the host's primary local address.
    /// Tunnels are point-to-point; the local address is the LAN one.
    fn is_local_candidate(&self) -> bool {
        self.up && !self.loopback && !self.point_to_point
    }
}

/// The host's primary outbound-capable, non-loopback IPv4 address.
///
/// Enumeration failure yields `None`, never an error.
#[must_use]
pub fn local_ipv4() -> Option<String> {
    enumerate()
        .into_iter()
        .find(IfEntry::is_local_candidate)
        .map(|e| e.ip.to_string())
}

/// Hash of the interface table (names, addresses, up flags).
///
/// Two equal signatures mean no observable path change between the calls;
/// a delta is treated as a network-change trigger by the engine.
#[must_use]
pub fn interface_signature() -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for entry in enumerate() {
        if entry.loopback {
            continue;
        }
        entry.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn enumerate() -> Vec<IfEntry> {
    let mut entries = Vec::new();

    let mut ifap: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs allocates a linked list we walk and then release
    // with freeifaddrs. No pointer is held past the free.
    unsafe {
        if libc::getifaddrs(&mut ifap) != 0 {
            return entries;
        }

        let mut cursor = ifap;
        while !cursor.is_null() {
            let ifa = &*cursor;
            cursor = ifa.ifa_next;

            if ifa.ifa_addr.is_null() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            if (*ifa.ifa_addr).sa_family != libc::AF_INET as libc::sa_family_t {
                continue;
            }

            let name = if ifa.ifa_name.is_null() {
                String::new()
            } else {
                CStr::from_ptr(ifa.ifa_name).to_string_lossy().into_owned()
            };

            let sin = &*ifa.ifa_addr.cast::<libc::sockaddr_in>();
            let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));

            #[allow(clippy::cast_sign_loss)]
            let flag = |f: libc::c_int| (ifa.ifa_flags & f as libc::c_uint) != 0;
            entries.push(IfEntry {
                name,
                ip,
                up: flag(libc::IFF_UP),
                loopback: flag(libc::IFF_LOOPBACK),
                point_to_point: flag(libc::IFF_POINTOPOINT),
            });
        }

        libc::freeifaddrs(ifap);
    }

    entries
}

#[cfg(not(unix))]
fn enumerate() -> Vec<IfEntry> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ipv4_shape() {
        // Can't assume the test host has a qualifying interface, but any
        // answer must be a dotted quad.
        if let Some(ip) = local_ipv4() {
            assert!(crate::utils::looks_like_ipv4(&ip), "got: {ip}");
        }
    }

    #[test]
    fn test_signature_is_stable_between_adjacent_calls() {
        assert_eq!(interface_signature(), interface_signature());
    }

    #[test]
    fn test_candidate_filter() {
        let mk = |up, loopback, p2p| IfEntry {
            name: "en0".to_string(),
            ip: Ipv4Addr::new(192, 168, 1, 20),
            up,
            loopback,
            point_to_point: p2p,
        };
        assert!(mk(true, false, false).is_local_candidate());
        assert!(!mk(false, false, false).is_local_candidate());
        assert!(!mk(true, true, false).is_local_candidate());
        assert!(!mk(true, false, true).is_local_candidate());
    }
}
