use std::any::TypeId;
use btleplug::api::{Central, CentralEvent, CharPropFlags, Characteristic, Peripheral as _, ValueNotification, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use futures::{future, SinkExt, Stream, StreamExt};
use futures::channel::mpsc::Sender;
use iced::subscription::{self, Subscription};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::device::constants::NOTIFICATION_CHANNEL_SIZE;
use crate::device::scanner::device_address;
use crate::device::types::SessionEvent;
use crate::error::DeviceError;

/// A connected peripheral with a subscribed characteristic. Dropping a session does not disconnect,
/// use `disconnect()`.
#[derive(Debug, Clone)]
pub struct Session {
    peripheral: Peripheral,
    characteristic: Characteristic,
    address: String,
}

impl Session {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn characteristic_uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    fn write_type(&self) -> WriteType {
        if self.characteristic.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        }
    }

    pub async fn write(&self, bytes: &[u8]) -> Result<(), DeviceError> {
        self.peripheral.write(&self.characteristic, bytes, self.write_type()).await?;
        Ok(())
    }

    /// Unsubscribe, then disconnect. The disconnect is attempted even if unsubscribing failed.
    pub async fn disconnect(self) -> Result<(), DeviceError> {
        info!("Unsubscribing from characteristic {}", self.characteristic.uuid);
        let unsubscribed = self.peripheral.unsubscribe(&self.characteristic).await;
        if let Err(err) = &unsubscribed {
            warn!("Failed to unsubscribe: {:?}", err);
        }

        info!("Disconnecting from {}", self.address);
        self.peripheral.disconnect().await?;
        unsubscribed?;
        Ok(())
    }
}

async fn find_peripheral(adapter: &Adapter, address: &str) -> Result<Peripheral, DeviceError> {
    for peripheral in adapter.peripherals().await? {
        match peripheral.properties().await {
            Ok(Some(properties)) => {
                if device_address(&peripheral, &properties).eq_ignore_ascii_case(address) {
                    return Ok(peripheral);
                }
            },
            Ok(None) => {},
            Err(err) => {
                warn!("Could not query peripheral for properties: {:?}", err);
            },
        }
    }

    Err(DeviceError::PeripheralNotFound { address: address.to_string() })
}

async fn subscribe_characteristic(peripheral: &Peripheral, uuid: Uuid) -> Result<Characteristic, DeviceError> {
    info!("Connected; Discovering services...");
    peripheral.discover_services().await?;

    let characteristic = peripheral
        .characteristics()
        .into_iter()
        .find(|characteristic| characteristic.uuid == uuid)
        .ok_or(DeviceError::MissingCharacteristic { uuid })?;

    if !characteristic.properties.intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE) {
        return Err(DeviceError::NotSubscribable { uuid });
    }

    info!("Subscribing to characteristic {:?} {:?}", characteristic.service_uuid, characteristic.uuid);
    peripheral.subscribe(&characteristic).await?;
    Ok(characteristic)
}

pub async fn connect(adapter: Adapter, address: String, uuid: Uuid) -> Result<Session, DeviceError> {
    let peripheral = find_peripheral(&adapter, &address).await?;

    info!("Connecting to peripheral {}...", address);
    peripheral.connect().await?;

    match subscribe_characteristic(&peripheral, uuid).await {
        Ok(characteristic) => {
            info!("Peripheral ready");
            Ok(Session { peripheral, characteristic, address })
        },
        Err(err) => {
            // do not leave a connection behind that the user can no longer disconnect
            if let Err(disconnect_err) = peripheral.disconnect().await {
                warn!("Failed to disconnect after failed setup: {:?}", disconnect_err);
            }
            Err(err)
        },
    }
}

// Resolves when the peripheral disconnects, or with an error if the notification stream ends.
async fn forward_notifications<N, D>(
    connected: bool,
    uuid: Uuid,
    mut notifications: N,
    mut disconnects: D,
    output: &mut Sender<SessionEvent>,
) -> Result<(), DeviceError>
where
    N: Stream<Item = ValueNotification> + Unpin,
    D: Stream<Item = ()> + Unpin,
{
    // the disconnect may have happened before `disconnects` was subscribed
    if !connected {
        return Ok(());
    }

    loop {
        tokio::select! {
            notification = notifications.next() => match notification {
                Some(data) => {
                    if data.uuid == uuid {
                        output.send(SessionEvent::Notification(data.value)).await?;
                    }
                },
                None => return Err(DeviceError::NotificationsEnded),
            },
            Some(()) = disconnects.next() => return Ok(()),
        }
    }
}

async fn forward_session_events(adapter: &Adapter, session: &Session, output: &mut Sender<SessionEvent>) -> Result<(), DeviceError> {
    let notifications = session.peripheral.notifications().await?;
    let peripheral_id = session.peripheral.id();
    let disconnects = adapter.events().await?.filter_map(move |event| {
        let disconnected = matches!(&event, CentralEvent::DeviceDisconnected(id) if *id == peripheral_id);
        future::ready(disconnected.then_some(()))
    });
    let connected = session.peripheral.is_connected().await?;

    forward_notifications(connected, session.characteristic_uuid(), notifications, disconnects, output).await
}

/// Delivers notifications of `session` until the peripheral goes away. `epoch` distinguishes
/// consecutive sessions with the same device. If the session breaks while the peripheral may still
/// be connected, `SessionEvent::Failed` asks the receiver to disconnect it.
pub fn session_subscription(epoch: u64, adapter: Adapter, session: Session) -> Subscription<SessionEvent> {
    struct Notifications;

    subscription::channel(
        (TypeId::of::<Notifications>(), epoch),
        NOTIFICATION_CHANNEL_SIZE,
        move |mut output| async move {
            let event = match forward_session_events(&adapter, &session, &mut output).await {
                Ok(()) => {
                    warn!("Connection lost: {} disconnected", session.address());
                    SessionEvent::ConnectionLost("Device disconnected".to_string())
                },
                Err(err) => {
                    warn!("Session with {} failed: {:?}", session.address(), err);
                    SessionEvent::Failed(err.to_string())
                },
            };

            if let Err(err) = output.send(event).await {
                debug!("Connection loss not delivered: {}", err);
            }

            // subscription::channel expects the future to never resolve
            future::pending().await
        },
    )
}
