//! The in-memory device registry.
//!
//! One `Registry` is built at startup and shared by handle. A single mutex
//! guards the device list: readers copy the list out before releasing it,
//! and every mutation holds it through the matching store write, so other
//! registry calls observe mutation and persist as one step.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use wolweb_core::types::parse_mac;
use wolweb_core::{Device, DeviceId};

use crate::error::{RegistryError, Result};
use crate::store::DeviceStore;

pub struct Registry {
    store: Box<dyn DeviceStore>,
    devices: Mutex<Vec<Device>>,
}

impl Registry {
    /// Create an empty registry over `store`. Call [`Registry::load`] to read
    /// existing devices.
    pub fn new(store: impl DeviceStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            devices: Mutex::new(Vec::new()),
        }
    }

    /// Create a registry and load it from `store` in one step.
    pub fn open(store: impl DeviceStore + 'static) -> Result<Self> {
        let registry = Self::new(store);
        registry.load()?;
        Ok(registry)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Device>> {
        // No code path leaves the list half-updated, so poisoning is ignored.
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the in-memory list with the store's contents.
    pub fn load(&self) -> Result<()> {
        let mut devices = self.lock();
        *devices = self.store.load()?;
        tracing::info!(count = devices.len(), "Devices loaded");
        Ok(())
    }

    /// Snapshot of all devices in insertion order.
    pub fn list(&self) -> Vec<Device> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Register a device.
    ///
    /// The MAC is validated and stored in canonical `AA:BB:CC:DD:EE:FF` form;
    /// a non-empty IP must be an IPv4 literal and is stored in dotted-quad form.
    /// Fails with `DuplicateDevice` when the MAC, or a non-empty IP, is
    /// already registered. If the store write fails the device stays
    /// registered in memory and `Persistence` is returned; the next
    /// successful save brings the file back in line.
    pub fn add(&self, mut device: Device) -> Result<Device> {
        device.mac =
            parse_mac(&device.mac).map_err(|_| RegistryError::InvalidMac(device.mac.clone()))?;
        if device.has_ip() {
            let ip: Ipv4Addr = device
                .ip
                .parse()
                .map_err(|_| RegistryError::InvalidIp(device.ip.clone()))?;
            device.ip = ip.to_string();
        }

        let mut devices = self.lock();
        let duplicate = devices
            .iter()
            .any(|d| d.mac_matches(&device.mac) || (device.has_ip() && d.ip == device.ip));
        if duplicate {
            return Err(RegistryError::DuplicateDevice {
                mac: device.mac,
                ip: device.ip,
            });
        }

        devices.push(device.clone());
        tracing::info!(id = %device.id, mac = %device.mac, ip = %device.ip, "Device added");

        if let Err(e) = self.store.save(&devices) {
            tracing::warn!(id = %device.id, error = %e, "Device added but not persisted");
            return Err(e.into());
        }
        Ok(device)
    }

    /// Remove a device by id, returning it. Nothing is written when the id
    /// is unknown.
    pub fn remove(&self, id: &DeviceId) -> Result<Device> {
        let mut devices = self.lock();
        let index = devices
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let removed = devices.remove(index);
        tracing::info!(id = %removed.id, mac = %removed.mac, "Device removed");

        self.store.save(&devices)?;
        Ok(removed)
    }

    pub fn get(&self, id: &DeviceId) -> Result<Device> {
        self.lock()
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Write the current list to the store unconditionally.
    pub fn save(&self) -> Result<()> {
        let devices = self.lock();
        self.store.save(&devices)?;
        Ok(())
    }

    /// Apply one liveness sweep and persist once.
    ///
    /// Reachable devices go online with `last_online = now`; unreachable ones
    /// go offline and keep their previous `last_online`. Ids missing from
    /// `results` are left untouched.
    pub(crate) fn apply_statuses(
        &self,
        results: &HashMap<DeviceId, bool>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut devices = self.lock();
        for device in devices.iter_mut() {
            if let Some(&online) = results.get(&device.id) {
                device.is_online = online;
                if online {
                    device.last_online = Some(now);
                }
            }
        }
        self.store.save(&devices)?;
        Ok(())
    }
}
