//! Local network selection and host enumeration.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use wolweb_core::probe::InterfaceEnumerator;

use crate::error::{DiscoverError, Result};

/// Pick the first non-loopback IPv4 address reported by `interfaces`.
///
/// The returned net keeps the host address (`addr()`) alongside the prefix.
pub fn local_network(interfaces: &dyn InterfaceEnumerator) -> Result<Ipv4Net> {
    let addrs = interfaces
        .ipv4_networks()
        .map_err(DiscoverError::Interfaces)?;

    addrs
        .into_iter()
        .find(|net| !net.addr().is_loopback())
        .ok_or(DiscoverError::NoLocalNetwork)
}

/// Usable host addresses in a network of the given prefix length:
/// `2^(32 - prefix) - 2`, floored at zero for /31 and /32.
pub fn usable_host_count(prefix_len: u8) -> u32 {
    let size = 1u64 << (32 - u32::from(prefix_len.min(32)));
    size.saturating_sub(2) as u32
}

/// The first `min(usable, cap)` host addresses after the network address.
pub fn host_addresses(net: Ipv4Net, cap: u32) -> Vec<Ipv4Addr> {
    let count = usable_host_count(net.prefix_len()).min(cap);
    let base = u32::from(net.network());
    (1..=count).map(|offset| Ipv4Addr::from(base + offset)).collect()
}

/// Addresses to probe for `local`: its host range without `local` itself.
pub fn scan_targets(local: Ipv4Net, cap: u32) -> Vec<Ipv4Addr> {
    let own = local.addr();
    host_addresses(local, cap)
        .into_iter()
        .filter(|ip| *ip != own)
        .collect()
}
