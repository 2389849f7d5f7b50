use log::debug;

use crate::device::connection::Session;
use crate::error::{DeviceError, PayloadError};

fn is_hex_input(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_hexdigit() || c == ' ')
}

/// Text made up of hex digits and spaces is sent as the bytes it spells ("AA BB" => [0xAA, 0xBB]),
/// anything else is sent as utf-8.
pub fn encode_payload(text: &str) -> Result<Vec<u8>, PayloadError> {
    if is_hex_input(text) {
        let digits: String = text.chars().filter(|c| *c != ' ').collect();
        return Ok(hex::decode(digits)?);
    }

    Ok(text.as_bytes().to_vec())
}

/// Uppercase hex, one space between bytes.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encode and write `text` to the session's characteristic, returning the bytes written.
pub async fn send(session: Session, text: String) -> Result<Vec<u8>, DeviceError> {
    let bytes = encode_payload(text.trim())?;
    debug!("Writing {} bytes to {}", bytes.len(), session.characteristic_uuid());

    session.write(&bytes).await?;
    Ok(bytes)
}
