//! Error types for the wolweb-registry crate.

use thiserror::Error;
use wolweb_core::DeviceId;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Device with MAC {mac} or IP {ip} already exists")]
    DuplicateDevice { mac: String, ip: String },

    #[error("Device not found: {0}")]
    NotFound(DeviceId),

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Invalid IPv4 address: {0}")]
    InvalidIp(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
