//! wolweb-core: Shared types, capability traits, and configuration for wolweb.
//!
//! This crate provides the foundational pieces used by the registry and the
//! discovery scanner:
//! - Device and scan-candidate types, plus MAC address normalization
//! - Capability traits for host probing, neighbor tables, and interfaces
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod probe;
pub mod types;

pub use error::CoreError;
pub use types::{Device, DeviceId, ScannedDevice};
