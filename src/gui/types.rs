use btleplug::platform::Adapter;
use iced::window;

use crate::device::connection::Session;
use crate::device::types::{ScanEvent, SessionEvent};

#[derive(Debug, Clone)]
pub enum Message {
    CloseRequested(window::Id),
    AdapterReady(Result<Adapter, String>),

    FilterChanged(String),
    StartScan,
    Scan(ScanEvent),
    ErrorDialogClosed(()),
    SelectDevice(String),

    CharacteristicChanged(String),
    ToggleConnection,
    ConnectComplete(Result<Session, String>),
    DisconnectComplete(Result<(), String>),
    Session(SessionEvent),

    SendChanged(String),
    Send,
    SendComplete(Result<Vec<u8>, String>),

    CloseAfterDisconnect(window::Id, Result<(), String>),
}
