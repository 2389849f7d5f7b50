use std::time::Duration;
use clap::Parser;
use clap::builder::TypedValueParser;
use log::LevelFilter;
use uuid::Uuid;

use crate::config::types::Config;
use crate::device::constants::{DEFAULT_CHARACTERISTIC_UUID, MAX_LOG_LINES, SCAN_DURATION};

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Scan for Bluetooth LE peripherals, connect to one, and exchange raw bytes with a characteristic.", long_about = None)]
pub struct Args {
    /// Duration of a single scan, in seconds
    #[arg(long, default_value_t = SCAN_DURATION / 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub scan_seconds: u64,

    /// Characteristic to subscribe to and write to, pre-filled in the form
    #[arg(long, default_value_t = DEFAULT_CHARACTERISTIC_UUID)]
    pub characteristic: Uuid,

    /// Only report peripherals advertising this service. May be given multiple times.
    #[arg(long = "service")]
    pub services: Vec<Uuid>,

    /// Initial name/address filter
    #[arg(long, default_value = "")]
    pub filter: String,

    /// Maximum number of lines kept in the receive log
    #[arg(long, default_value_t = MAX_LOG_LINES, value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize))]
    pub max_log_lines: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let log_level = args.log_level();

        Config {
            scan_duration: Duration::from_secs(args.scan_seconds),
            scan_services: args.services,
            characteristic: args.characteristic,
            filter: args.filter,
            max_log_lines: args.max_log_lines,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        let args = std::iter::once("ble-debugger").chain(args.iter().copied());
        Args::try_parse_from(args).map(Config::from)
    }

    #[test]
    fn test_defaults_match_config_default() {
        assert_eq!(parse(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_all_options() {
        let config = parse(&[
            "--scan-seconds", "5",
            "--characteristic", "6e400003-b5a3-f393-e0a9-e50e24dcca9e",
            "--service", "6e400001-b5a3-f393-e0a9-e50e24dcca9e",
            "--service", "0000180f-0000-1000-8000-00805f9b34fb",
            "--filter", "ffe1",
            "--max-log-lines", "50",
            "-vv",
        ]).unwrap();

        assert_eq!(config.scan_duration, Duration::from_secs(5));
        assert_eq!(config.characteristic, Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E));
        assert_eq!(config.scan_services, vec![
            Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E),
            Uuid::from_u128(0x0000180F_0000_1000_8000_00805F9B34FB),
        ]);
        assert_eq!(config.filter, "ffe1");
        assert_eq!(config.max_log_lines, 50);
        assert_eq!(config.log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_rejects_zero_scan_duration() {
        assert!(parse(&["--scan-seconds", "0"]).is_err());
    }

    #[test]
    fn test_rejects_invalid_uuid() {
        assert!(parse(&["--characteristic", "ffe1"]).is_err());
    }
}
