use uuid::Uuid;

/**
 * How long (milliseconds) a scan listens for advertisements before stopping.
 */
pub const SCAN_DURATION: u64 = 10_000;

/**
 * Capacity of the on-screen scan event channel.
 */
pub const SCAN_CHANNEL_SIZE: usize = 64;

/**
 * Capacity of the on-screen notification channel.
 */
pub const NOTIFICATION_CHANNEL_SIZE: usize = 128;

/**
 * The characteristic pre-filled in the form. This is the serial data characteristic found on the
 * common HM-10 / CC254x based modules.
 */
pub const DEFAULT_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000ffe1_0000_1000_8000_00805f9b34fb);

/**
 * Maximum number of lines kept in the receive log.
 */
pub const MAX_LOG_LINES: usize = 1000;

/**
 * Displayed in place of a missing or unprintable advertised name.
 */
pub const UNKNOWN_NAME: &str = "Unknown";

/**
 * Displayed in place of a missing signal strength.
 */
pub const UNKNOWN_RSSI: &str = "N/A";
