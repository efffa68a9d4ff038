//! Capability traits for everything the core needs from the operating system.
//!
//! The registry and scanner only ever talk to these traits; the OS-backed
//! implementations live in `wolweb-discover::system` and tests supply fakes.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::Ipv4Net;

/// Single-attempt liveness check against one address.
///
/// Unreachable hosts, timeouts, and failures to launch the probe all
/// collapse to `false`.
#[async_trait]
pub trait HostReachability: Send + Sync {
    async fn probe(&self, ip: &str, timeout: Duration) -> bool;
}

/// Source of the raw address-resolution cache dump.
#[async_trait]
pub trait NeighborTable: Send + Sync {
    async fn read_table(&self) -> io::Result<String>;
}

/// Enumerates local IPv4 addresses together with their prefix length.
pub trait InterfaceEnumerator: Send + Sync {
    /// Addresses in OS order. Each `Ipv4Net` carries the host address
    /// (not the network address) and the interface prefix.
    fn ipv4_networks(&self) -> io::Result<Vec<Ipv4Net>>;
}
