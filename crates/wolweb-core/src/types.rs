//! Core domain types for the wolweb device registry.
//!
//! `Device` is the persisted, wakeable endpoint; `ScannedDevice` is the
//! transient result of a discovery scan and is never stored on its own.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Port a wake packet targets when the operator does not pick one.
pub const DEFAULT_WAKE_PORT: &str = "9";

// ── Device ────────────────────────────────────────────────────────

/// Opaque device identifier.
///
/// Fresh ids are UUID v4 strings. Ids read back from an existing store are
/// kept verbatim, whatever their shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A registered, wakeable network endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Canonical uppercase, colon-separated hardware address.
    pub mac: String,
    /// IPv4 literal, empty when unknown.
    #[serde(default)]
    pub ip: String,
    /// Wake target port in string form.
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub is_online: bool,
    /// Time of the last successful probe; `None` until the first one.
    #[serde(default, deserialize_with = "deserialize_last_online")]
    pub last_online: Option<DateTime<Utc>>,
}

impl Device {
    /// Build a new offline device with a fresh id.
    ///
    /// An empty `port` falls back to [`DEFAULT_WAKE_PORT`].
    pub fn new(name: &str, mac: &str, ip: &str, port: &str) -> Self {
        let port = if port.trim().is_empty() {
            DEFAULT_WAKE_PORT
        } else {
            port.trim()
        };
        Self {
            id: DeviceId::new(),
            name: name.to_string(),
            mac: mac.to_string(),
            ip: ip.trim().to_string(),
            port: port.to_string(),
            is_online: false,
            last_online: None,
        }
    }

    pub fn has_ip(&self) -> bool {
        !self.ip.is_empty()
    }

    /// MAC comparison across spellings (case, `-`/`:`, dotted groups).
    ///
    /// Values that do not parse fall back to a plain normalized comparison.
    pub fn mac_matches(&self, other: &str) -> bool {
        comparable_mac(&self.mac) == comparable_mac(other)
    }
}

fn comparable_mac(raw: &str) -> String {
    parse_mac(raw).unwrap_or_else(|_| normalize_mac(raw))
}

/// Stores written by older builds encode "never online" as the zero time
/// `0001-01-01T00:00:00Z`; read that back as `None`.
fn deserialize_last_online<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let ts: Option<DateTime<Utc>> = Option::deserialize(deserializer)?;
    Ok(ts.filter(|t| t.year() > 1))
}

// ── Scan results ──────────────────────────────────────────────────

/// One neighbor-cache entry found during a discovery scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScannedDevice {
    pub ip: String,
    pub mac: String,
}

// ── MAC addresses ─────────────────────────────────────────────────

/// Uppercase a MAC and turn `-` separators into `:`.
///
/// Does not validate; use [`parse_mac`] for operator input.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim().replace('-', ":").to_uppercase()
}

/// Parse a 48-bit MAC in colon, hyphen, or dotted (`aabb.ccdd.eeff`) form and
/// return it as `AA:BB:CC:DD:EE:FF`.
pub fn parse_mac(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let invalid = || CoreError::InvalidMac(raw.to_string());

    let hex: String = if trimmed.contains('.') {
        let groups: Vec<&str> = trimmed.split('.').collect();
        if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
            return Err(invalid());
        }
        groups.concat()
    } else {
        let sep = if trimmed.contains(':') { ':' } else { '-' };
        let groups: Vec<&str> = trimmed.split(sep).collect();
        if groups.len() != 6 || groups.iter().any(|g| g.len() != 2) {
            return Err(invalid());
        }
        groups.concat()
    };

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let upper = hex.to_uppercase();
    let octets: Vec<&str> = (0..6).map(|i| &upper[i * 2..i * 2 + 2]).collect();
    Ok(octets.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mac_accepts_common_forms() {
        assert_eq!(parse_mac("aa:bb:cc:dd:ee:ff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(parse_mac("AA-BB-CC-00-11-22").unwrap(), "AA:BB:CC:00:11:22");
        assert_eq!(parse_mac("aabb.ccdd.eeff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(parse_mac("  01:02:03:04:05:06 ").unwrap(), "01:02:03:04:05:06");
    }

    #[test]
    fn parse_mac_rejects_garbage() {
        for bad in ["", "aa:bb:cc:dd:ee", "aa:bb:cc:dd:ee:gg", "aabbccddeeff", "a:b:c:d:e:f"] {
            assert!(
                matches!(parse_mac(bad), Err(CoreError::InvalidMac(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn mac_matching_ignores_case_and_separator() {
        let dev = Device::new("nas", "AA:BB:CC:DD:EE:FF", "", "");
        assert!(dev.mac_matches("aa-bb-cc-dd-ee-ff"));
        assert!(!dev.mac_matches("aa-bb-cc-dd-ee-00"));
    }

    #[test]
    fn mac_matching_understands_dotted_form() {
        let mut dev = Device::new("nas", "", "", "");
        dev.mac = "aabb.ccdd.eeff".into();
        assert!(dev.mac_matches("AA:BB:CC:DD:EE:FF"));
        assert!(!dev.mac_matches("AA:BB:CC:DD:EE:00"));
    }

    #[test]
    fn new_device_defaults() {
        let dev = Device::new("desktop", "AA:BB:CC:DD:EE:FF", " 10.0.0.5 ", "");
        assert_eq!(dev.port, DEFAULT_WAKE_PORT);
        assert_eq!(dev.ip, "10.0.0.5");
        assert!(!dev.is_online);
        assert!(dev.last_online.is_none());
        assert_ne!(dev.id, Device::new("x", "y", "", "").id);
    }

    #[test]
    fn zero_time_reads_as_never_online() {
        let json = r#"{
            "id": "1700000000000000000",
            "name": "legacy",
            "mac": "AA:BB:CC:DD:EE:FF",
            "ip": "",
            "port": "9",
            "is_online": false,
            "last_online": "0001-01-01T00:00:00Z"
        }"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.id.as_str(), "1700000000000000000");
        assert!(dev.last_online.is_none());
    }

    #[test]
    fn real_timestamp_survives() {
        let json = r#"{"id":"a","name":"n","mac":"AA:BB:CC:DD:EE:FF","last_online":"2024-05-01T10:00:00Z"}"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.last_online.unwrap().year(), 2024);
        assert_eq!(dev.port, "");
    }
}
