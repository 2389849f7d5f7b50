use indexmap::IndexMap;

use crate::device::types::DiscoveredDevice;

/// Case-insensitive substring match against a device's address or displayed name. The text is
/// used as typed, including surrounding spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    needle: String,
}

impl DeviceFilter {
    pub fn new(text: &str) -> Self {
        DeviceFilter { needle: text.to_lowercase() }
    }

    pub fn matches(&self, device: &DiscoveredDevice) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        device.address.to_lowercase().contains(&self.needle)
            || device.display_name().to_lowercase().contains(&self.needle)
    }
}

/// Devices seen during the current scan, one entry per address, in order of first discovery.
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    devices: IndexMap<String, DiscoveredDevice>,
}

impl DeviceList {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(address: &str) -> String {
        address.to_uppercase()
    }

    /// Insert a device or refresh the entry with the same address.
    /// Returns true if the address was not seen before.
    pub fn upsert(&mut self, device: DiscoveredDevice) -> bool {
        let key = Self::key(&device.address);

        match self.devices.get_mut(&key) {
            Some(existing) => {
                // keep a name we already know when a later advertisement omits it
                if device.name.is_some() {
                    existing.name = device.name;
                }
                existing.rssi = device.rssi;
                false
            },
            None => {
                self.devices.insert(key, device);
                true
            },
        }
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&DiscoveredDevice> {
        self.devices.get(&Self::key(address))
    }

    pub fn visible<'a>(&'a self, filter: &'a DeviceFilter) -> impl Iterator<Item = &'a DiscoveredDevice> + 'a {
        self.devices.values().filter(move |device| filter.matches(device))
    }
}
