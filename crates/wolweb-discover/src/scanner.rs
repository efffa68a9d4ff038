//! Subnet discovery scan.
//!
//! A scan runs in three strictly ordered phases: probe every host address
//! (bounded by a semaphore), wait a fixed settle delay, then read and parse
//! the neighbor table. Probe outcomes are discarded; probing only exists to
//! make the OS resolve live neighbors before the table is read.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use wolweb_core::config::ScannerConfig;
use wolweb_core::probe::{HostReachability, InterfaceEnumerator, NeighborTable};
use wolweb_core::ScannedDevice;

use crate::error::{DiscoverError, Result};
use crate::{neighbor, subnet};

pub struct NetworkScanner {
    interfaces: Arc<dyn InterfaceEnumerator>,
    reachability: Arc<dyn HostReachability>,
    neighbors: Arc<dyn NeighborTable>,
    config: ScannerConfig,
}

impl NetworkScanner {
    pub fn new(
        interfaces: Arc<dyn InterfaceEnumerator>,
        reachability: Arc<dyn HostReachability>,
        neighbors: Arc<dyn NeighborTable>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            interfaces,
            reachability,
            neighbors,
            config,
        }
    }

    /// Discover `(ip, mac)` pairs on the local subnet.
    ///
    /// Fails only when there is no usable local network or the neighbor
    /// table cannot be read. An empty result is a normal outcome.
    pub async fn scan(&self) -> Result<Vec<ScannedDevice>> {
        let start = Instant::now();
        let local = subnet::local_network(self.interfaces.as_ref())?;
        let targets = subnet::scan_targets(local, self.config.max_hosts);

        tracing::info!(
            local = %local,
            targets = targets.len(),
            max_in_flight = self.config.max_in_flight,
            "Starting discovery scan"
        );

        self.warm_neighbor_cache(targets).await;
        tokio::time::sleep(self.config.settle_delay()).await;

        let table = self
            .neighbors
            .read_table()
            .await
            .map_err(DiscoverError::NeighborTable)?;
        let found = neighbor::parse_neighbor_table(&table);

        tracing::info!(
            local = %local,
            found = found.len(),
            duration_ms = start.elapsed().as_millis(),
            "Discovery scan complete"
        );

        Ok(found)
    }

    /// Probe all targets, at most `max_in_flight` at a time, and return once
    /// every probe task has finished.
    async fn warm_neighbor_cache(&self, targets: Vec<Ipv4Addr>) {
        let gate = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let timeout = self.config.probe_timeout();
        let attempts = self.config.retries + 1;
        let mut handles = Vec::with_capacity(targets.len());

        for ip in targets {
            let gate = Arc::clone(&gate);
            let reachability = Arc::clone(&self.reachability);

            let handle = tokio::spawn(async move {
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                let ip = ip.to_string();
                for attempt in 1..=attempts {
                    if reachability.probe(&ip, timeout).await {
                        tracing::trace!(ip = %ip, attempt, "Host answered");
                        break;
                    }
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Probe task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ipnet::Ipv4Net;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedInterfaces(Vec<Ipv4Net>);

    impl InterfaceEnumerator for FixedInterfaces {
        fn ipv4_networks(&self) -> io::Result<Vec<Ipv4Net>> {
            Ok(self.0.clone())
        }
    }

    /// Counts attempts per address and tracks how many probes overlap.
    #[derive(Default)]
    struct CountingProbe {
        answer: bool,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicUsize,
        attempts: Mutex<HashMap<String, usize>>,
    }

    #[async_trait]
    impl HostReachability for CountingProbe {
        async fn probe(&self, ip: &str, _timeout: Duration) -> bool {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            *self.attempts.lock().unwrap().entry(ip.to_string()).or_default() += 1;

            tokio::time::sleep(Duration::from_millis(2)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    /// Returns a canned table and records how many probes had finished
    /// when it was read.
    struct CannedTable {
        text: Option<&'static str>,
        probe: Arc<CountingProbe>,
        finished_at_read: AtomicUsize,
    }

    #[async_trait]
    impl NeighborTable for CannedTable {
        async fn read_table(&self) -> io::Result<String> {
            self.finished_at_read
                .store(self.probe.finished.load(Ordering::SeqCst), Ordering::SeqCst);
            match self.text {
                Some(text) => Ok(text.to_string()),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "arp missing")),
            }
        }
    }

    fn test_config(max_in_flight: usize) -> ScannerConfig {
        ScannerConfig {
            max_in_flight,
            settle_delay_ms: 0,
            ..ScannerConfig::default()
        }
    }

    fn scanner(
        local: &str,
        probe: Arc<CountingProbe>,
        table: Arc<CannedTable>,
        config: ScannerConfig,
    ) -> NetworkScanner {
        let ifaces = FixedInterfaces(vec!["127.0.0.1/8".parse().unwrap(), local.parse().unwrap()]);
        NetworkScanner::new(Arc::new(ifaces), probe, table, config)
    }

    fn canned(text: Option<&'static str>, probe: &Arc<CountingProbe>) -> Arc<CannedTable> {
        Arc::new(CannedTable {
            text,
            probe: Arc::clone(probe),
            finished_at_read: AtomicUsize::new(0),
        })
    }

    const TABLE: &str = "\
? (192.168.1.1) at 11:22:33:44:55:66 [ether] on eth0
? (192.168.1.20) at aa:bb:cc:dd:ee:ff [ether] on eth0
? (192.168.1.255) at ff:ff:ff:ff:ff:ff [ether] on eth0
";

    #[tokio::test]
    async fn scan_probes_subnet_then_reads_table() {
        let probe = Arc::new(CountingProbe {
            answer: true,
            ..Default::default()
        });
        let table = canned(Some(TABLE), &probe);
        let scanner = scanner("192.168.1.50/24", probe.clone(), table.clone(), test_config(100));

        let found = scanner.scan().await.unwrap();

        let attempts = probe.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 253);
        assert!(!attempts.contains_key("192.168.1.50"));
        assert!(attempts.values().all(|&n| n == 1));
        assert_eq!(table.finished_at_read.load(Ordering::SeqCst), 253);

        assert_eq!(
            found,
            vec![
                ScannedDevice {
                    ip: "192.168.1.1".into(),
                    mac: "11:22:33:44:55:66".into()
                },
                ScannedDevice {
                    ip: "192.168.1.20".into(),
                    mac: "AA:BB:CC:DD:EE:FF".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_probes_are_retried_once() {
        let probe = Arc::new(CountingProbe::default());
        let table = canned(Some(""), &probe);
        let scanner = scanner("10.0.0.1/29", probe.clone(), table.clone(), test_config(100));

        let found = scanner.scan().await.unwrap();

        assert!(found.is_empty());
        let attempts = probe.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 5);
        assert!(attempts.values().all(|&n| n == 2));
        assert_eq!(table.finished_at_read.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn probes_in_flight_never_exceed_limit() {
        let probe = Arc::new(CountingProbe {
            answer: true,
            ..Default::default()
        });
        let table = canned(Some(""), &probe);
        let scanner = scanner("172.16.0.9/24", probe.clone(), table, test_config(8));

        scanner.scan().await.unwrap();

        let peak = probe.peak.load(Ordering::SeqCst);
        assert!(peak <= 8, "peak in-flight probes was {peak}");
        assert!(peak >= 1);
    }

    /// Records the (possibly paused) clock at the moment the table is read.
    #[derive(Default)]
    struct TimedTable {
        read_at: Mutex<Option<tokio::time::Instant>>,
    }

    #[async_trait]
    impl NeighborTable for TimedTable {
        async fn read_table(&self) -> io::Result<String> {
            *self.read_at.lock().unwrap() = Some(tokio::time::Instant::now());
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn table_is_read_only_after_settle_delay() {
        let probe = Arc::new(CountingProbe {
            answer: true,
            ..Default::default()
        });
        let table = Arc::new(TimedTable::default());
        let ifaces = FixedInterfaces(vec!["10.0.0.1/30".parse().unwrap()]);
        let config = ScannerConfig {
            settle_delay_ms: 500,
            ..ScannerConfig::default()
        };
        let scanner = NetworkScanner::new(Arc::new(ifaces), probe, table.clone(), config);

        let started = tokio::time::Instant::now();
        scanner.scan().await.unwrap();

        let read_at = table.read_at.lock().unwrap().unwrap();
        assert!(read_at - started >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn no_local_network_fails_before_probing() {
        let probe = Arc::new(CountingProbe::default());
        let table = canned(Some(TABLE), &probe);
        let ifaces = FixedInterfaces(vec!["127.0.0.1/8".parse().unwrap()]);
        let scanner = NetworkScanner::new(Arc::new(ifaces), probe.clone(), table, test_config(100));

        let result = scanner.scan().await;

        assert!(matches!(result, Err(DiscoverError::NoLocalNetwork)));
        assert!(probe.attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_table_is_an_error() {
        let probe = Arc::new(CountingProbe {
            answer: true,
            ..Default::default()
        });
        let table = canned(None, &probe);
        let scanner = scanner("10.0.0.1/30", probe, table, test_config(100));

        assert!(matches!(scanner.scan().await, Err(DiscoverError::NeighborTable(_))));
    }
}
