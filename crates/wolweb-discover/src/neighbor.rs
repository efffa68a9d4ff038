//! Neighbor (ARP) table parsing.
//!
//! Different platforms dump the cache in different layouts, so parsing is
//! line-oriented and layout-agnostic: the first IPv4 literal and the first
//! hardware address after it form one candidate. Every layout prints the MAC
//! after the IP, and hostnames before the IP can look like a MAC. Lines
//! missing either are skipped without error.
//!
//! Layouts seen in practice:
//! ```text
//! Linux arp -a:   ? (192.168.1.1) at 11:22:33:44:55:66 [ether] on eth0
//! macOS arp -a:   ? (192.168.1.1) at 0:11:2:33:44:55 on en0 ifscope [ethernet]
//! Windows arp -a:   192.168.1.1          11-22-33-44-55-66     dynamic
//! /proc/net/arp:  192.168.1.1  0x1  0x2  11:22:33:44:55:66  *  eth0
//! ```

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;
use wolweb_core::ScannedDevice;

fn ip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("IPv4 pattern compiles")
    })
}

fn mac_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[0-9A-Fa-f]{1,2}(?:[:-][0-9A-Fa-f]{1,2}){5}\b").expect("MAC pattern compiles")
    })
}

/// Parse a raw neighbor table into filtered candidates.
///
/// MACs come out as uppercase colon form, reserved addresses are dropped,
/// and only the first row per MAC is kept, in table order.
pub fn parse_neighbor_table(raw: &str) -> Vec<ScannedDevice> {
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    for line in raw.lines() {
        let Some(ip) = ip_pattern().find(line) else {
            continue;
        };
        let Some(mac) = mac_pattern().find_at(line, ip.end()) else {
            continue;
        };

        let ip = ip.as_str();
        let mac = canonical_mac(mac.as_str());

        if !is_valid_scan_ip(ip) || !is_valid_mac(&mac) {
            tracing::trace!(ip, mac = %mac, "Skipping reserved neighbor entry");
            continue;
        }

        if seen.insert(mac.clone()) {
            devices.push(ScannedDevice {
                ip: ip.to_string(),
                mac,
            });
        }
    }

    devices
}

/// Uppercase, colon-separated, two digits per octet (`0:1b:…` becomes `00:1B:…`).
fn canonical_mac(token: &str) -> String {
    token
        .split([':', '-'])
        .map(|octet| format!("{:0>2}", octet.to_uppercase()))
        .collect::<Vec<_>>()
        .join(":")
}

/// Whether an IPv4 literal can belong to a real neighbor.
///
/// Rejects malformed literals, 224.x and 239.x multicast, 240.x and above,
/// loopback, and 169.254.x link-local.
pub fn is_valid_scan_ip(ip: &str) -> bool {
    let Ok(addr) = ip.parse::<Ipv4Addr>() else {
        return false;
    };
    let [first, second, ..] = addr.octets();

    !(first == 224 || first == 239 || first >= 240 || first == 127 || (first == 169 && second == 254))
}

/// Whether a canonical MAC can belong to a real neighbor.
///
/// Rejects broadcast (`FF:FF:FF` prefix), IPv4 multicast (`01:00:5E`),
/// IPv6 multicast (`33:33`), and the all-zero placeholder of incomplete entries.
pub fn is_valid_mac(mac: &str) -> bool {
    let mac = mac.to_uppercase();
    !(mac.starts_with("FF:FF:FF")
        || mac.starts_with("01:00:5E")
        || mac.starts_with("33:33")
        || mac == "00:00:00:00:00:00")
}
