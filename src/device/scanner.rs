use std::any::TypeId;
use std::collections::HashSet;
use std::time::Duration;
use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::{future, SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use iced::subscription::{self, Subscription};
use log::{debug, info, trace, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::device::constants::SCAN_CHANNEL_SIZE;
use crate::device::types::{DiscoveredDevice, ScanEvent};
use crate::error::DeviceError;

pub async fn open_adapter() -> Result<Adapter, DeviceError> {
    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(DeviceError::NoAdapter)?;

    info!("Using adapter {}", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
    Ok(adapter)
}

/// The address shown to the user. macOS does not expose the bluetooth address, in which case the
/// platform peripheral id is used.
pub fn device_address(peripheral: &Peripheral, properties: &PeripheralProperties) -> String {
    if properties.address == BDAddr::default() {
        peripheral.id().to_string()
    } else {
        properties.address.to_string()
    }
}

async fn describe_peripheral(peripheral: &Peripheral, services: &[Uuid]) -> Result<Option<DiscoveredDevice>, DeviceError> {
    let properties = match peripheral.properties().await? {
        Some(properties) => properties,
        None => return Ok(None),
    };

    // Some environments ignore the scan filter, so make sure to check the service uuids again
    if !services.is_empty() && !properties.services.iter().any(|uuid| services.contains(uuid)) {
        return Ok(None);
    }

    Ok(Some(DiscoveredDevice::new(
        properties.local_name.as_deref(),
        device_address(peripheral, &properties),
        properties.rssi.into(),
    )))
}

async fn report_peripheral(
    peripheral: &Peripheral,
    services: &[Uuid],
    seen: &mut HashSet<String>,
    sink: &mut Sender<ScanEvent>,
) -> Result<(), DeviceError> {
    match describe_peripheral(peripheral, services).await {
        Ok(Some(device)) => {
            trace!("Found {} | {} | RSSI: {}", device.address, device.display_name(), device.rssi);
            seen.insert(device.address.to_uppercase());
            sink.send(ScanEvent::Discovered(device)).await?;
        },
        Ok(None) => {},
        Err(err) => {
            warn!("Could not query peripheral for properties: {:?}", err);
        },
    }

    Ok(())
}

/// Scan for `duration`, reporting every peripheral to `sink` as soon as it is seen, and once more
/// when the scan stops. Returns the number of distinct addresses reported.
pub async fn scan(
    adapter: &Adapter,
    services: Vec<Uuid>,
    duration: Duration,
    cancel: CancellationToken,
    sink: &mut Sender<ScanEvent>,
) -> Result<usize, DeviceError> {
    let mut events = adapter.events().await?;
    let mut seen: HashSet<String> = HashSet::new();

    info!("Scanning for {:?}...", duration);
    adapter.start_scan(ScanFilter { services: services.clone() }).await?;

    let listened = async {
        let deadline = sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    break;
                },
                _ = cancel.cancelled() => {
                    info!("Scan cancelled");
                    break;
                },
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDiscovered(id)) | Some(CentralEvent::DeviceUpdated(id)) => {
                        match adapter.peripheral(&id).await {
                            Ok(peripheral) => report_peripheral(&peripheral, &services, &mut seen, &mut *sink).await?,
                            Err(err) => debug!("Failed to get peripheral {:?}: {}", id, err),
                        }
                    },
                    Some(_) => {},
                    None => {
                        warn!("Adapter event stream ended before the scan finished");
                        break;
                    },
                },
            }
        }

        Ok::<(), DeviceError>(())
    }.await;

    // always stop the adapter, even if delivering an event failed
    let stopped = adapter.stop_scan().await;
    listened?;
    stopped?;

    if !cancel.is_cancelled() {
        for peripheral in adapter.peripherals().await? {
            report_peripheral(&peripheral, &services, &mut seen, sink).await?;
        }
    }

    Ok(seen.len())
}

/// Runs one scan per `generation`; starting a scan with a new generation replaces the old one.
pub fn scan_subscription(
    generation: u64,
    adapter: Adapter,
    services: Vec<Uuid>,
    duration: Duration,
    cancel: CancellationToken,
) -> Subscription<ScanEvent> {
    struct Scan;

    subscription::channel(
        (TypeId::of::<Scan>(), generation),
        SCAN_CHANNEL_SIZE,
        move |mut output| async move {
            let result = match scan(&adapter, services, duration, cancel, &mut output).await {
                Ok(count) => {
                    info!("Scan complete, {} devices found", count);
                    Ok(count)
                },
                Err(err) => {
                    warn!("Scanning failed {:?}", err);
                    Err(err.to_string())
                },
            };

            if let Err(err) = output.send(ScanEvent::Finished(result)).await {
                debug!("Scan result not delivered: {}", err);
            }

            // subscription::channel expects the future to never resolve
            future::pending().await
        },
    )
}
