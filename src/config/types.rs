use std::time::Duration;
use log::LevelFilter;
use uuid::Uuid;

use crate::device::constants::{DEFAULT_CHARACTERISTIC_UUID, MAX_LOG_LINES, SCAN_DURATION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long a single scan listens for advertisements.
    pub scan_duration: Duration,
    /// Restrict scans to peripherals advertising one of these services. Empty means no restriction.
    pub scan_services: Vec<Uuid>,
    /// Pre-filled value of the characteristic field.
    pub characteristic: Uuid,
    /// Pre-filled value of the device filter field.
    pub filter: String,
    pub max_log_lines: usize,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scan_duration: Duration::from_millis(SCAN_DURATION),
            scan_services: Vec::new(),
            characteristic: DEFAULT_CHARACTERISTIC_UUID,
            filter: String::new(),
            max_log_lines: MAX_LOG_LINES,
            log_level: LevelFilter::Info,
        }
    }
}
