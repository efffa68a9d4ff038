//! Configuration management for wolweb.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`WOLWEB__` prefix, `__` separator)
//! 2. Config file (`wolweb.toml` by default, optional)
//! 3. Defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::CoreError;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WolwebConfig {
    /// Path of the JSON device store.
    #[serde(default = "default_devices_file")]
    pub devices_file: PathBuf,

    /// Liveness prober settings.
    #[serde(default)]
    pub prober: ProberConfig,

    /// Discovery scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// Settings for the registry liveness sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct ProberConfig {
    /// Per-device probe timeout in milliseconds (single attempt).
    #[serde(default = "default_status_timeout_ms")]
    pub probe_timeout_ms: u64,
}

/// Settings for subnet discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Upper bound on host addresses probed per scan.
    #[serde(default = "default_max_hosts")]
    pub max_hosts: u32,

    /// Maximum probes in flight at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Timeout of one probe attempt in milliseconds.
    #[serde(default = "default_scan_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Extra attempts after a failed probe.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between the last probe and reading the neighbor table.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl ProberConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl ScannerConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// `data/devices.json` when a `data` directory exists (container layout),
/// otherwise `devices.json` in the working directory.
pub fn default_devices_file() -> PathBuf {
    devices_file_in(Path::new("."))
}

fn devices_file_in(base: &Path) -> PathBuf {
    if base.join("data").is_dir() {
        PathBuf::from("data").join("devices.json")
    } else {
        PathBuf::from("devices.json")
    }
}

fn default_status_timeout_ms() -> u64 {
    1000
}

fn default_max_hosts() -> u32 {
    512
}

fn default_max_in_flight() -> usize {
    100
}

fn default_scan_timeout_ms() -> u64 {
    if cfg!(windows) {
        500
    } else {
        1000
    }
}

fn default_retries() -> u32 {
    1
}

fn default_settle_delay_ms() -> u64 {
    500
}

impl Default for WolwebConfig {
    fn default() -> Self {
        Self {
            devices_file: default_devices_file(),
            prober: ProberConfig::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_status_timeout_ms(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_hosts: default_max_hosts(),
            max_in_flight: default_max_in_flight(),
            probe_timeout_ms: default_scan_timeout_ms(),
            retries: default_retries(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Load configuration from `<file_prefix>.{toml,json,yaml}` (optional) and
/// `WOLWEB__*` environment variables.
pub fn load(file_prefix: &str) -> Result<WolwebConfig, CoreError> {
    let cfg = ::config::Config::builder()
        .add_source(::config::File::with_name(file_prefix).required(false))
        .add_source(
            ::config::Environment::with_prefix("WOLWEB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(cfg.try_deserialize()?)
}
