use thiserror::Error;
use msgbox::IconType;
use std::fmt::{Debug, Display};
use futures::channel::mpsc::SendError;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to initialize logging: {source}")]
    Logging { #[from] source: fern::InitError },
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Invalid hex input: {source}")]
    InvalidHex { #[from] source: hex::FromHexError },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter available")]
    NoAdapter,

    #[error("Device {address} is not known to the adapter, scan again")]
    PeripheralNotFound { address: String },

    #[error("Characteristic {uuid} is not available on this device")]
    MissingCharacteristic { uuid: Uuid },

    #[error("Characteristic {uuid} does not support notifications")]
    NotSubscribable { uuid: Uuid },

    #[error("Notification stream ended")]
    NotificationsEnded,

    #[error("{source}")]
    Payload { #[from] source: PayloadError },

    #[error("Failed to deliver device event: {source}")]
    Channel { #[from] source: SendError },
}

impl DeviceError {
    pub fn is_permission_error(&self) -> bool {
        matches!(self, DeviceError::Btle { source: btleplug::Error::PermissionDenied })
    }
}

pub fn error_msgbox<T: Display>(message: &str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("BLE Debugger ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
