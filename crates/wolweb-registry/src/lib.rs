//! wolweb-registry: The authoritative list of wakeable devices.
//!
//! Holds the in-memory registry behind a single lock, mirrors every mutation
//! to a JSON file, and sweeps registered devices for reachability.

pub mod error;
pub mod prober;
pub mod registry;
pub mod store;

pub use error::{RegistryError, Result};
pub use prober::{LivenessProber, SweepSummary};
pub use registry::Registry;
pub use store::{DeviceStore, JsonFileStore, StoreError};
