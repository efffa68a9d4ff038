//! OS-backed capability implementations.
//!
//! Probing shells out to the platform `ping`, the neighbor table comes from
//! `arp -a` (or `/proc/net/arp` on Linux hosts without net-tools), and
//! interfaces are enumerated through pnet.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::Ipv4Net;
use pnet::datalink;
use pnet::ipnetwork::IpNetwork;
use tokio::process::Command;
use wolweb_core::probe::{HostReachability, InterfaceEnumerator, NeighborTable};

/// Single ICMP echo through the system `ping` utility.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPing;

impl SystemPing {
    /// Arguments for one echo with `timeout`, in the platform's dialect.
    fn args(ip: &str, timeout: Duration) -> Vec<String> {
        let millis = timeout.as_millis().max(1);
        let wait = if cfg!(windows) {
            vec!["-n".to_string(), "1".to_string(), "-w".to_string(), millis.to_string()]
        } else if cfg!(target_os = "macos") {
            // macOS takes -W in milliseconds.
            vec!["-c".to_string(), "1".to_string(), "-W".to_string(), millis.to_string()]
        } else {
            let secs = millis.div_ceil(1000);
            vec!["-c".to_string(), "1".to_string(), "-W".to_string(), secs.to_string()]
        };
        let mut args = wait;
        args.push(ip.to_string());
        args
    }
}

#[async_trait]
impl HostReachability for SystemPing {
    async fn probe(&self, ip: &str, timeout: Duration) -> bool {
        let status = Command::new("ping")
            .args(Self::args(ip, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(ip, error = %e, "Failed to run ping");
                false
            }
        }
    }
}

/// Reads the OS address-resolution cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNeighborTable;

const PROC_NET_ARP: &str = "/proc/net/arp";

#[async_trait]
impl NeighborTable for SystemNeighborTable {
    async fn read_table(&self) -> io::Result<String> {
        match Command::new("arp").arg("-a").output().await {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => Err(io::Error::other(format!(
                "arp -a exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound && cfg!(target_os = "linux") => {
                tracing::debug!("arp not installed, reading {PROC_NET_ARP}");
                tokio::fs::read_to_string(PROC_NET_ARP).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Interface addresses as reported by pnet.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl SystemInterfaces {
    /// `(interface name, address)` pairs for every IPv4 address, in OS order.
    pub fn named_ipv4_networks(&self) -> Vec<(String, Ipv4Net)> {
        let mut out = Vec::new();
        for iface in datalink::interfaces() {
            for network in &iface.ips {
                if let IpNetwork::V4(v4) = network {
                    if let Ok(net) = Ipv4Net::new(v4.ip(), v4.prefix()) {
                        out.push((iface.name.clone(), net));
                    }
                }
            }
        }
        out
    }
}

impl InterfaceEnumerator for SystemInterfaces {
    fn ipv4_networks(&self) -> io::Result<Vec<Ipv4Net>> {
        Ok(self
            .named_ipv4_networks()
            .into_iter()
            .map(|(_, net)| net)
            .collect())
    }
}
