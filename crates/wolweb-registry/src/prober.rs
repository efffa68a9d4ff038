//! Liveness sweeps over the registered devices.
//!
//! Every device with an IP gets one probe task. Tasks report over a channel
//! to the sweep, which owns the result map; the registry is only touched
//! again once every task has reported or exited.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use wolweb_core::config::ProberConfig;
use wolweb_core::probe::HostReachability;
use wolweb_core::DeviceId;

use crate::registry::Registry;

/// Counts from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Devices that were actually probed (had an IP).
    pub probed: usize,
    pub online: usize,
    pub offline: usize,
}

pub struct LivenessProber {
    registry: Arc<Registry>,
    reachability: Arc<dyn HostReachability>,
    timeout: Duration,
}

impl LivenessProber {
    pub fn new(
        registry: Arc<Registry>,
        reachability: Arc<dyn HostReachability>,
        config: &ProberConfig,
    ) -> Self {
        Self {
            registry,
            reachability,
            timeout: config.probe_timeout(),
        }
    }

    /// Probe every registered device once and record the outcome.
    ///
    /// Works on the devices present when the sweep starts. A failed store
    /// write is logged; the new statuses stay in memory regardless.
    pub async fn update_statuses(&self) -> SweepSummary {
        let snapshot = self.registry.list();
        let (tx, mut rx) = mpsc::unbounded_channel::<(DeviceId, bool)>();
        let mut summary = SweepSummary::default();

        for device in snapshot {
            if !device.has_ip() {
                let _ = tx.send((device.id, false));
                continue;
            }

            summary.probed += 1;
            let tx = tx.clone();
            let reachability = Arc::clone(&self.reachability);
            let timeout = self.timeout;

            tokio::spawn(async move {
                let online = reachability.probe(&device.ip, timeout).await;
                tracing::debug!(id = %device.id, ip = %device.ip, online, "Probe finished");
                let _ = tx.send((device.id, online));
            });
        }
        drop(tx);

        let mut results: HashMap<DeviceId, bool> = HashMap::new();
        while let Some((id, online)) = rx.recv().await {
            if online {
                summary.online += 1;
            } else {
                summary.offline += 1;
            }
            results.insert(id, online);
        }

        // The store write is blocking file I/O under the registry lock.
        let registry = Arc::clone(&self.registry);
        let applied =
            tokio::task::spawn_blocking(move || registry.apply_statuses(&results, Utc::now()))
                .await;
        match applied {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to persist device statuses"),
            Err(e) => tracing::warn!(error = %e, "Status update task failed"),
        }

        tracing::info!(
            probed = summary.probed,
            online = summary.online,
            offline = summary.offline,
            "Status sweep complete"
        );
        summary
    }
}
