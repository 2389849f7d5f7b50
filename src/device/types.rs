use std::fmt;

use crate::device::constants::{UNKNOWN_NAME, UNKNOWN_RSSI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rssi {
    Known(i16),
    Unknown,
}

impl From<Option<i16>> for Rssi {
    fn from(value: Option<i16>) -> Self {
        match value {
            Some(rssi) => Rssi::Known(rssi),
            None => Rssi::Unknown,
        }
    }
}

impl fmt::Display for Rssi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rssi::Known(rssi) => write!(f, "{}", rssi),
            Rssi::Unknown => write!(f, "{}", UNKNOWN_RSSI),
        }
    }
}

/// A peripheral seen during the current scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub name: Option<String>,
    pub address: String,
    pub rssi: Rssi,
}

impl DiscoveredDevice {
    pub fn new(name: Option<&str>, address: impl Into<String>, rssi: Rssi) -> Self {
        DiscoveredDevice {
            name: name.and_then(clean_name),
            address: address.into(),
            rssi,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}

// Advertised names are arbitrary bytes; keep the printable ascii part only.
fn clean_name(name: &str) -> Option<String> {
    let cleaned: String = name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Discovered(DiscoveredDevice),
    /// Number of distinct devices seen, or the reason the scan failed.
    Finished(Result<usize, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Notification(Vec<u8>),
    /// The peripheral disconnected.
    ConnectionLost(String),
    /// The session stopped working while the peripheral may still be connected; it has to be
    /// disconnected.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_cleaning() {
        let device = DiscoveredDevice::new(Some("  HM-10 \u{1F600}"), "AA:BB:CC:DD:EE:FF", Rssi::Known(-60));
        assert_eq!(device.name.as_deref(), Some("HM-10"));
        assert_eq!(device.display_name(), "HM-10");
    }

    #[test]
    fn test_unprintable_name_is_unknown() {
        let device = DiscoveredDevice::new(Some("温度计"), "AA:BB:CC:DD:EE:FF", Rssi::Unknown);
        assert_eq!(device.name, None);
        assert_eq!(device.display_name(), UNKNOWN_NAME);

        let device = DiscoveredDevice::new(None, "AA:BB:CC:DD:EE:FF", Rssi::Unknown);
        assert_eq!(device.display_name(), UNKNOWN_NAME);
    }

    #[test]
    fn test_rssi_display() {
        assert_eq!(Rssi::from(Some(-72)).to_string(), "-72");
        assert_eq!(Rssi::from(None).to_string(), "N/A");
    }
}
