use std::mem;
use log::{info, warn};
use uuid::Uuid;

use crate::config::types::Config;
use crate::device::list::{DeviceFilter, DeviceList};
use crate::device::transfer::format_hex;
use crate::device::types::DiscoveredDevice;
use crate::gui::receive_log::ReceiveLog;

/// The connection as seen by the form. `S` is the session handle, owned here while connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link<S> {
    Disconnected,
    Connecting { address: String },
    Connected(S),
    Disconnecting,
}

/// Work the application has to start after a click on the connect button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRequest<S> {
    Connect { address: String, uuid: Uuid },
    Disconnect(S),
}

pub struct AppState<S> {
    devices: DeviceList,
    filter_text: String,
    filter: DeviceFilter,
    selected: Option<String>,
    characteristic_text: String,
    send_text: String,

    adapter_ready: bool,
    scanning: bool,
    // identifies the running scan, incremented for every scan
    scan_generation: u64,

    link: Link<S>,
    // identifies the current session, incremented for every successful connect
    link_epoch: u64,

    log: ReceiveLog,
}

impl<S> AppState<S> {
    pub fn new(config: &Config) -> Self {
        AppState {
            devices: DeviceList::new(),
            filter_text: config.filter.clone(),
            filter: DeviceFilter::new(&config.filter),
            selected: None,
            characteristic_text: config.characteristic.to_string(),
            send_text: String::new(),
            adapter_ready: false,
            scanning: false,
            scan_generation: 0,
            link: Link::Disconnected,
            link_epoch: 0,
            log: ReceiveLog::new(config.max_log_lines),
        }
    }

    fn system(&mut self, message: String) {
        info!("{}", message);
        self.log.system(message);
    }

    fn error(&mut self, message: String) {
        warn!("{}", message);
        self.log.error(message);
    }

    pub fn log(&self) -> &ReceiveLog {
        &self.log
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn characteristic_text(&self) -> &str {
        &self.characteristic_text
    }

    pub fn send_text(&self) -> &str {
        &self.send_text
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn scan_generation(&self) -> u64 {
        self.scan_generation
    }

    pub fn link(&self) -> &Link<S> {
        &self.link
    }

    pub fn link_epoch(&self) -> u64 {
        self.link_epoch
    }

    pub fn session(&self) -> Option<&S> {
        match &self.link {
            Link::Connected(session) => Some(session),
            _ => None,
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn visible_devices(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.visible(&self.filter)
    }

    pub fn adapter_ready(&mut self) {
        self.adapter_ready = true;
        self.system("Bluetooth adapter ready, move close to the device and start a scan".to_string());
    }

    pub fn adapter_failed(&mut self, error: &str) {
        self.adapter_ready = false;
        self.error(format!("Bluetooth unavailable: {}", error));
    }

    pub fn set_filter_text(&mut self, text: String) {
        self.filter = DeviceFilter::new(&text);
        self.filter_text = text;
    }

    pub fn characteristic_editable(&self) -> bool {
        matches!(self.link, Link::Disconnected)
    }

    pub fn set_characteristic_text(&mut self, text: String) {
        if self.characteristic_editable() {
            self.characteristic_text = text;
        }
    }

    pub fn set_send_text(&mut self, text: String) {
        self.send_text = text;
    }

    pub fn can_scan(&self) -> bool {
        self.adapter_ready && !self.scanning
    }

    /// Clears the device list and returns the generation of the new scan.
    pub fn begin_scan(&mut self, duration_secs: u64) -> Option<u64> {
        if !self.can_scan() {
            return None;
        }

        self.devices.clear();
        if matches!(self.link, Link::Disconnected) {
            self.selected = None;
        }
        self.scanning = true;
        self.scan_generation += 1;
        self.system(format!("Scanning for BLE devices ({}s)...", duration_secs));

        Some(self.scan_generation)
    }

    pub fn device_discovered(&mut self, device: DiscoveredDevice) {
        if self.scanning {
            self.devices.upsert(device);
        }
    }

    /// Returns the error message if the scan failed.
    pub fn scan_finished(&mut self, result: Result<usize, String>) -> Option<String> {
        self.scanning = false;

        match result {
            Ok(count) => {
                self.system(format!("Scan complete, {} devices found", count));
                None
            },
            Err(error) => {
                self.error(format!("Scan failed: {}", error));
                Some(error)
            },
        }
    }

    pub fn select_device(&mut self, address: &str) {
        if !matches!(self.link, Link::Disconnected) {
            return;
        }

        if let Some(device) = self.devices.get(address) {
            let address = device.address.clone();
            self.system(format!("Selected device: {}", address));
            self.selected = Some(address);
        }
    }

    pub fn can_toggle_connection(&self) -> bool {
        match self.link {
            Link::Disconnected => self.selected.is_some(),
            Link::Connected(_) => true,
            Link::Connecting { .. } | Link::Disconnecting => false,
        }
    }

    /// Connect when disconnected, disconnect when connected; nothing while either is in progress.
    pub fn toggle_connection(&mut self) -> Option<LinkRequest<S>> {
        match mem::replace(&mut self.link, Link::Disconnected) {
            Link::Disconnected => {
                let address = self.selected.clone()?;

                let uuid = match Uuid::parse_str(self.characteristic_text.trim()) {
                    Ok(uuid) => uuid,
                    Err(err) => {
                        self.error(format!("Invalid characteristic UUID {:?}: {}", self.characteristic_text, err));
                        return None;
                    },
                };

                self.system(format!("Connecting to {}...", address));
                self.link = Link::Connecting { address: address.clone() };
                Some(LinkRequest::Connect { address, uuid })
            },
            Link::Connected(session) => {
                self.system("Disconnecting...".to_string());
                self.link = Link::Disconnecting;
                Some(LinkRequest::Disconnect(session))
            },
            other => {
                self.link = other;
                None
            },
        }
    }

    pub fn connect_finished(&mut self, result: Result<S, String>) {
        let address = match &self.link {
            Link::Connecting { address } => address.clone(),
            _ => return,
        };

        match result {
            Ok(session) => {
                self.link_epoch += 1;
                self.link = Link::Connected(session);
                self.system(format!("Connected: {}", address));
            },
            Err(error) => {
                self.link = Link::Disconnected;
                self.error(format!("Connect failed: {}", error));
            },
        }
    }

    pub fn disconnect_finished(&mut self, result: Result<(), String>) {
        self.link = Link::Disconnected;
        self.selected = None;

        match result {
            Ok(()) => self.system("Disconnected".to_string()),
            Err(error) => self.error(format!("Disconnect error: {}", error)),
        }
    }

    pub fn connection_lost(&mut self, reason: &str) {
        if let Link::Connected(_) = self.link {
            self.link = Link::Disconnected;
            self.selected = None;
            self.error(format!("Connection lost: {}", reason));
        }
    }

    /// Returns the session, which is still connected and has to be disconnected. The link stays
    /// in `Disconnecting` until `disconnect_finished`.
    pub fn session_failed(&mut self, reason: &str) -> Option<S> {
        match mem::replace(&mut self.link, Link::Disconnecting) {
            Link::Connected(session) => {
                self.error(format!("Connection lost: {}", reason));
                self.system("Disconnecting...".to_string());
                Some(session)
            },
            other => {
                self.link = other;
                None
            },
        }
    }

    pub fn notification(&mut self, bytes: &[u8]) {
        self.log.received(bytes);
    }

    /// Take the session out for a final disconnect.
    pub fn take_session(&mut self) -> Option<S> {
        match mem::replace(&mut self.link, Link::Disconnecting) {
            Link::Connected(session) => Some(session),
            other => {
                self.link = other;
                None
            },
        }
    }

    pub fn can_send(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    pub fn send_finished(&mut self, result: Result<Vec<u8>, String>) {
        match result {
            Ok(bytes) => {
                self.send_text.clear();
                self.system(format!("Sent: {}", format_hex(&bytes)));
            },
            Err(error) => self.error(format!("Send failed: {}", error)),
        }
    }
}

impl<S: Clone> AppState<S> {
    /// The session and text to send, or None when there is nothing to send.
    pub fn begin_send(&self) -> Option<(S, String)> {
        let text = self.send_text.trim();
        if text.is_empty() {
            return None;
        }

        self.session().map(|session| (session.clone(), text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::device::constants::DEFAULT_CHARACTERISTIC_UUID;
    use crate::device::types::Rssi;
    use crate::gui::receive_log::LogKind;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FakeSession(&'static str);

    fn ready_state() -> AppState<FakeSession> {
        let mut state = AppState::new(&Config::default());
        state.adapter_ready();
        state
    }

    fn discover(state: &mut AppState<FakeSession>, name: Option<&str>, address: &str) {
        state.device_discovered(DiscoveredDevice::new(name, address, Rssi::Known(-50)));
    }

    fn visible(state: &AppState<FakeSession>) -> Vec<String> {
        state.visible_devices().map(|device| device.address.clone()).collect()
    }

    fn connected_state() -> AppState<FakeSession> {
        let mut state = ready_state();
        state.begin_scan(10);
        discover(&mut state, Some("HM-10"), "AA:BB:CC:DD:EE:FF");
        state.select_device("AA:BB:CC:DD:EE:FF");
        state.toggle_connection();
        state.connect_finished(Ok(FakeSession("hm10")));
        state
    }

    #[test]
    fn test_scan_requires_adapter() {
        let mut state: AppState<FakeSession> = AppState::new(&Config::default());
        assert!(!state.can_scan());
        assert_eq!(state.begin_scan(10), None);

        state.adapter_ready();
        assert_eq!(state.begin_scan(10), Some(1));
        assert!(!state.can_scan());
        assert_eq!(state.begin_scan(10), None);
    }

    #[test]
    fn test_scan_without_filter_lists_every_distinct_address() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, Some("A"), "00:00:00:00:00:01");
        discover(&mut state, None, "00:00:00:00:00:02");
        discover(&mut state, Some("A"), "00:00:00:00:00:01");
        assert_eq!(state.scan_finished(Ok(2)), None);

        assert_eq!(visible(&state), vec!["00:00:00:00:00:01", "00:00:00:00:00:02"]);
        assert!(state.can_scan());
    }

    #[test]
    fn test_filter_typed_before_scan() {
        let mut state = ready_state();
        state.set_filter_text("ffe1".to_string());
        state.begin_scan(5);
        discover(&mut state, Some("FFE1 module"), "00:00:00:00:00:01");
        discover(&mut state, Some("Watch"), "00:00:00:00:00:02");
        discover(&mut state, None, "00:00:00:00:FF:E1");
        discover(&mut state, None, "7C:1F:FE:1A:00:00");

        assert_eq!(visible(&state), vec!["00:00:00:00:00:01"]);

        state.set_filter_text(String::new());
        assert_eq!(state.device_count(), 4);
        assert_eq!(visible(&state).len(), 4);
    }

    #[test]
    fn test_new_scan_clears_devices_and_selection() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, None, "00:00:00:00:00:01");
        state.scan_finished(Ok(1));
        state.select_device("00:00:00:00:00:01");

        assert_eq!(state.begin_scan(5), Some(2));
        assert_eq!(state.device_count(), 0);
        assert_eq!(state.selected(), None);
        assert!(!state.can_toggle_connection());
    }

    #[test]
    fn test_failed_scan_reports_error() {
        let mut state = ready_state();
        state.begin_scan(5);

        assert_eq!(state.scan_finished(Err("adapter busy".to_string())), Some("adapter busy".to_string()));
        assert!(state.can_scan());
        assert_eq!(state.log().last().unwrap().kind, LogKind::Error);
    }

    #[test]
    fn test_connect_disabled_until_selection() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, None, "AA:BB:CC:DD:EE:FF");
        assert!(!state.can_toggle_connection());
        assert_eq!(state.toggle_connection(), None);

        state.select_device("11:11:11:11:11:11");
        assert!(!state.can_toggle_connection());

        state.select_device("aa:bb:cc:dd:ee:ff");
        assert_eq!(state.selected(), Some("AA:BB:CC:DD:EE:FF"));
        assert!(state.can_toggle_connection());
    }

    #[test]
    fn test_connect_and_disconnect_cycle() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, None, "AA:BB:CC:DD:EE:FF");
        state.select_device("AA:BB:CC:DD:EE:FF");

        assert_eq!(
            state.toggle_connection(),
            Some(LinkRequest::Connect { address: "AA:BB:CC:DD:EE:FF".to_string(), uuid: DEFAULT_CHARACTERISTIC_UUID }),
        );
        assert!(!state.can_toggle_connection());
        assert!(!state.characteristic_editable());
        assert_eq!(state.toggle_connection(), None);

        state.connect_finished(Ok(FakeSession("one")));
        assert_eq!(state.session(), Some(&FakeSession("one")));
        assert_eq!(state.link_epoch(), 1);
        assert!(state.can_toggle_connection());
        assert!(state.can_send());

        assert_eq!(state.toggle_connection(), Some(LinkRequest::Disconnect(FakeSession("one"))));
        assert_eq!(state.link(), &Link::Disconnecting);
        assert!(!state.can_toggle_connection());
        assert!(!state.can_send());

        state.disconnect_finished(Ok(()));
        assert_eq!(state.link(), &Link::Disconnected);
        assert!(!state.can_toggle_connection());
        assert!(state.characteristic_editable());
    }

    #[test]
    fn test_failed_connect_keeps_selection() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, None, "AA:BB:CC:DD:EE:FF");
        state.select_device("AA:BB:CC:DD:EE:FF");
        state.toggle_connection();

        state.connect_finished(Err("timed out".to_string()));
        assert_eq!(state.link(), &Link::Disconnected);
        assert!(state.can_toggle_connection());
        assert_eq!(state.log().last().unwrap().text, "Connect failed: timed out");
    }

    #[test]
    fn test_disconnect_error_still_returns_to_disconnected() {
        let mut state = connected_state();
        state.toggle_connection();
        state.disconnect_finished(Err("not connected".to_string()));

        assert_eq!(state.link(), &Link::Disconnected);
        assert!(!state.can_toggle_connection());
    }

    #[test]
    fn test_invalid_characteristic_uuid() {
        let mut state = ready_state();
        state.begin_scan(5);
        discover(&mut state, None, "AA:BB:CC:DD:EE:FF");
        state.select_device("AA:BB:CC:DD:EE:FF");
        state.set_characteristic_text("ffe1".to_string());

        assert_eq!(state.toggle_connection(), None);
        assert_eq!(state.link(), &Link::Disconnected);
        assert_eq!(state.log().last().unwrap().kind, LogKind::Error);
    }

    #[test]
    fn test_characteristic_locked_while_connected() {
        let mut state = connected_state();
        state.set_characteristic_text("something else".to_string());
        assert_eq!(state.characteristic_text(), DEFAULT_CHARACTERISTIC_UUID.to_string());
    }

    #[test]
    fn test_selection_ignored_while_connected() {
        let mut state = connected_state();
        discover(&mut state, None, "11:22:33:44:55:66");
        state.select_device("11:22:33:44:55:66");
        assert_eq!(state.selected(), Some("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn test_send_cycle() {
        let mut state = connected_state();
        assert_eq!(state.begin_send(), None);

        state.set_send_text("  AA BB ".to_string());
        assert_eq!(state.begin_send(), Some((FakeSession("hm10"), "AA BB".to_string())));

        state.send_finished(Ok(vec![0xAA, 0xBB]));
        assert_eq!(state.send_text(), "");
        assert_eq!(state.log().last().unwrap().text, "Sent: AA BB");
    }

    #[test]
    fn test_failed_send_keeps_input() {
        let mut state = connected_state();
        state.set_send_text("ABC".to_string());
        state.send_finished(Err("Invalid hex input: Odd number of digits".to_string()));

        assert_eq!(state.send_text(), "ABC");
        assert_eq!(state.log().last().unwrap().kind, LogKind::Error);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut state = ready_state();
        state.set_send_text("hi".to_string());
        assert!(!state.can_send());
        assert_eq!(state.begin_send(), None);
    }

    #[test]
    fn test_connection_lost() {
        let mut state = connected_state();
        state.notification(&[0x01, 0x02]);
        assert_eq!(state.log().last().unwrap().text, "01 02");

        state.connection_lost("Device disconnected");
        assert_eq!(state.link(), &Link::Disconnected);
        assert_eq!(state.selected(), None);

        // a late loss report for an already closed link is ignored
        let entries = state.log().len();
        state.connection_lost("Device disconnected");
        assert_eq!(state.log().len(), entries);
    }

    #[test]
    fn test_failed_session_is_disconnected_before_reconnect() {
        let mut state = connected_state();
        discover(&mut state, Some("Other"), "11:22:33:44:55:66");

        assert_eq!(state.session_failed("Notification stream ended"), Some(FakeSession("hm10")));
        assert_eq!(state.link(), &Link::Disconnecting);
        assert!(!state.can_toggle_connection());
        assert!(!state.can_send());
        assert_eq!(state.toggle_connection(), None);

        // no second connection while the first one is torn down
        state.select_device("11:22:33:44:55:66");
        assert_eq!(state.selected(), Some("AA:BB:CC:DD:EE:FF"));

        state.disconnect_finished(Ok(()));
        assert_eq!(state.link(), &Link::Disconnected);
        assert_eq!(state.selected(), None);

        state.select_device("11:22:33:44:55:66");
        assert!(state.can_toggle_connection());
    }

    #[test]
    fn test_session_failure_without_link_is_ignored() {
        let mut state = ready_state();
        assert_eq!(state.session_failed("Notification stream ended"), None);
        assert_eq!(state.link(), &Link::Disconnected);

        let mut state = connected_state();
        state.connection_lost("Device disconnected");
        assert_eq!(state.session_failed("Notification stream ended"), None);
        assert_eq!(state.link(), &Link::Disconnected);
    }

    #[test]
    fn test_take_session_for_close() {
        let mut state = connected_state();
        assert_eq!(state.take_session(), Some(FakeSession("hm10")));
        assert_eq!(state.take_session(), None);

        let mut state = ready_state();
        assert_eq!(state.take_session(), None);
        assert_eq!(state.link(), &Link::Disconnected);
    }
}
