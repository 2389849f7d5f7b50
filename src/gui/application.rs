use btleplug::platform::Adapter;
use iced::{Alignment, Application, Color, Command, Element, Font, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::theme::{self, Theme};
use iced::widget::{
    Column, Space, button, column, container, horizontal_rule, row, scrollable, text, text_input,
};
use iced::widget::scrollable::RelativeOffset;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::types::Config;
use crate::device::connection::{connect, session_subscription, Session};
use crate::device::scanner::{open_adapter, scan_subscription};
use crate::device::transfer::send;
use crate::device::types::{DiscoveredDevice, ScanEvent, SessionEvent};
use crate::error::AppRunError;
use crate::gui::dialog::ErrorDialogs;
use crate::gui::executor::MyExecutor;
use crate::gui::receive_log::LogKind;
use crate::gui::state::{AppState, Link, LinkRequest};
use crate::gui::style::{DeviceRowStyleSheet, ERROR_TEXT_COLOR, RECEIVED_TEXT_COLOR, SYSTEM_TEXT_COLOR};
use crate::gui::types::Message;

const DEVICE_TABLE_HEIGHT: f32 = 220.0;

pub struct ApplicationFlags {
    config: Config,
}

pub struct MyApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    config: Config,

    // None until the adapter has been opened, or if there is none
    adapter: Option<Adapter>,

    state: AppState<Session>,

    dialogs: ErrorDialogs,

    log_scroll_id: scrollable::Id,
}

fn handle_event(event: Event, _status: event::Status) -> Option<Message> {
    match event {
        Event::Window(id, window::Event::CloseRequested) => Some(Message::CloseRequested(id)),
        _ => None,
    }
}

fn log_color(kind: LogKind) -> Color {
    match kind {
        LogKind::System => SYSTEM_TEXT_COLOR,
        LogKind::Error => ERROR_TEXT_COLOR,
        LogKind::Received => RECEIVED_TEXT_COLOR,
    }
}

impl MyApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn open_adapter(&self) -> Command<Message> {
        let fut = async move {
            open_adapter().await.map_err(|err| {
                error!("Failed to open bluetooth adapter: {:?}", &err);
                if err.is_permission_error() {
                    "Not allowed to access Bluetooth!".to_string()
                } else {
                    err.to_string()
                }
            })
        };

        Command::perform(fut, Message::AdapterReady)
    }

    fn scroll_log(&self) -> Command<Message> {
        scrollable::snap_to(self.log_scroll_id.clone(), RelativeOffset::END)
    }

    fn show_error_dialog(&self, message: &'static str, error: String) -> Command<Message> {
        Command::perform(self.dialogs.show(message, error), Message::ErrorDialogClosed)
    }

    fn connect(&self, address: String, uuid: Uuid) -> Command<Message> {
        let adapter = match &self.adapter {
            Some(adapter) => adapter.clone(),
            None => return Command::perform(
                async { Err("No bluetooth adapter available".to_string()) },
                Message::ConnectComplete,
            ),
        };

        let fut = async move {
            connect(adapter, address, uuid).await.map_err(|err| {
                warn!("Connecting to peripheral failed: {:?}", err);
                err.to_string()
            })
        };

        Command::perform(fut, Message::ConnectComplete)
    }

    fn disconnect(&self, session: Session) -> Command<Message> {
        let fut = async move {
            session.disconnect().await.map_err(|err| err.to_string())
        };

        Command::perform(fut, Message::DisconnectComplete)
    }

    fn send(&self, session: Session, text: String) -> Command<Message> {
        let fut = async move {
            send(session, text).await.map_err(|err| err.to_string())
        };

        Command::perform(fut, Message::SendComplete)
    }

    fn device_row(&self, device: &DiscoveredDevice) -> Element<Message> {
        let selected = self.state.selected() == Some(device.address.as_str());

        button(
            row![
                text(device.display_name()).width(Length::FillPortion(3)),
                text(&device.address).font(Font::MONOSPACE).width(Length::FillPortion(4)),
                text(device.rssi).width(Length::FillPortion(1)),
            ].spacing(10)
        )
            .width(Length::Fill)
            .style(theme::Button::Custom(Box::new(DeviceRowStyleSheet { selected })))
            .on_press(Message::SelectDevice(device.address.clone()))
            .into()
    }

    fn device_table(&self) -> Element<Message> {
        let header = row![
            text("Name").width(Length::FillPortion(3)),
            text("Address").width(Length::FillPortion(4)),
            text("RSSI").width(Length::FillPortion(1)),
        ]
            .spacing(10)
            .padding([0, 5]);

        let rows: Element<Message> = if self.state.visible_devices().next().is_none() {
            let placeholder = if self.state.is_scanning() {
                "Scanning…"
            } else if self.state.device_count() > 0 {
                "No device matches the filter"
            } else {
                "No devices, press Scan"
            };

            container(text(placeholder).style(SYSTEM_TEXT_COLOR))
                .padding(5)
                .into()
        } else {
            Column::with_children(
                self.state.visible_devices().map(|device| self.device_row(device))
            ).into()
        };

        column![
            header,
            scrollable(rows).height(DEVICE_TABLE_HEIGHT),
        ]
            .spacing(5)
            .into()
    }

    fn receive_log(&self) -> Element<Message> {
        let lines = Column::with_children(
            self.state.log().entries().map(|entry| -> Element<Message> {
                text(entry)
                    .font(Font::MONOSPACE)
                    .size(14)
                    .style(log_color(entry.kind))
                    .into()
            })
        )
            .width(Length::Fill)
            .padding([0, 5]);

        scrollable(lines)
            .id(self.log_scroll_id.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

impl Application for MyApplication {
    type Executor = MyExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (MyApplication, Command<Self::Message>) {
        let app = MyApplication {
            app_cancel: CancellationToken::new(),
            state: AppState::new(&flags.config),
            config: flags.config,
            adapter: None,
            dialogs: ErrorDialogs::start(),
            log_scroll_id: scrollable::Id::unique(),
        };

        let command = app.open_adapter();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("BLE Debugger ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::CloseRequested(id) => {
                info!("Close requested");
                self.before_close();

                if let Some(session) = self.state.take_session() {
                    let fut = async move {
                        session.disconnect().await.map_err(|err| err.to_string())
                    };
                    return Command::perform(fut, move |result| Message::CloseAfterDisconnect(id, result));
                }

                return window::close(id);
            },
            Message::CloseAfterDisconnect(id, result) => {
                if let Err(err) = result {
                    warn!("Failed to disconnect before closing: {}", err);
                }
                return window::close(id);
            },
            Message::AdapterReady(Ok(adapter)) => {
                self.adapter = Some(adapter);
                self.state.adapter_ready();
                return self.scroll_log();
            },
            Message::AdapterReady(Err(error)) => {
                self.state.adapter_failed(&error);
                return self.scroll_log();
            },

            Message::FilterChanged(text) => {
                self.state.set_filter_text(text);
            },
            Message::StartScan => {
                if self.state.begin_scan(self.config.scan_duration.as_secs()).is_some() {
                    return self.scroll_log();
                }
            },
            Message::Scan(ScanEvent::Discovered(device)) => {
                self.state.device_discovered(device);
            },
            Message::Scan(ScanEvent::Finished(result)) => {
                if let Some(error) = self.state.scan_finished(result) {
                    return Command::batch(vec![
                        self.scroll_log(),
                        self.show_error_dialog("Scan failed", error),
                    ]);
                }
                return self.scroll_log();
            },
            Message::ErrorDialogClosed(()) => {},
            Message::SelectDevice(address) => {
                self.state.select_device(&address);
                return self.scroll_log();
            },

            Message::CharacteristicChanged(text) => {
                self.state.set_characteristic_text(text);
            },
            Message::ToggleConnection => {
                let command = match self.state.toggle_connection() {
                    Some(LinkRequest::Connect { address, uuid }) => self.connect(address, uuid),
                    Some(LinkRequest::Disconnect(session)) => self.disconnect(session),
                    None => Command::none(),
                };

                return Command::batch(vec![command, self.scroll_log()]);
            },
            Message::ConnectComplete(result) => {
                self.state.connect_finished(result);
                return self.scroll_log();
            },
            Message::DisconnectComplete(result) => {
                self.state.disconnect_finished(result);
                return self.scroll_log();
            },
            Message::Session(SessionEvent::Notification(bytes)) => {
                self.state.notification(&bytes);
                return self.scroll_log();
            },
            Message::Session(SessionEvent::ConnectionLost(reason)) => {
                self.state.connection_lost(&reason);
                return self.scroll_log();
            },
            Message::Session(SessionEvent::Failed(reason)) => {
                if let Some(session) = self.state.session_failed(&reason) {
                    return Command::batch(vec![self.disconnect(session), self.scroll_log()]);
                }
                return self.scroll_log();
            },

            Message::SendChanged(text) => {
                self.state.set_send_text(text);
            },
            Message::Send => {
                if let Some((session, text)) = self.state.begin_send() {
                    return self.send(session, text);
                }
            },
            Message::SendComplete(result) => {
                self.state.send_finished(result);
                return self.scroll_log();
            },
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            event::listen_with(handle_event),
        ];

        if let Some(adapter) = &self.adapter {
            if self.state.is_scanning() {
                subscriptions.push(
                    scan_subscription(
                        self.state.scan_generation(),
                        adapter.clone(),
                        self.config.scan_services.clone(),
                        self.config.scan_duration,
                        self.app_cancel.child_token(),
                    ).map(Message::Scan)
                );
            }

            if let Some(session) = self.state.session() {
                subscriptions.push(
                    session_subscription(
                        self.state.link_epoch(),
                        adapter.clone(),
                        session.clone(),
                    ).map(Message::Session)
                );
            }
        }

        Subscription::batch(subscriptions)
    }

    fn view(&self) -> Element<Message> {
        let mut scan_button = button(
            text(if self.state.is_scanning() { "Scanning…" } else { "Scan" })
        )
            .style(theme::Button::Positive);

        if self.state.can_scan() {
            scan_button = scan_button.on_press(Message::StartScan);
        }

        let filter_input = text_input("Filter by name or address", self.state.filter_text())
            .on_input(Message::FilterChanged)
            .width(250);

        let (connect_label, connect_style) = match self.state.link() {
            Link::Disconnected => ("Connect", theme::Button::Primary),
            Link::Connecting { .. } => ("Connecting…", theme::Button::Primary),
            Link::Connected(_) => ("Disconnect", theme::Button::Destructive),
            Link::Disconnecting => ("Disconnecting…", theme::Button::Destructive),
        };

        let mut connect_button = button(text(connect_label)).style(connect_style);
        if self.state.can_toggle_connection() {
            connect_button = connect_button.on_press(Message::ToggleConnection);
        }

        let mut characteristic_input = text_input("Characteristic UUID", self.state.characteristic_text())
            .font(Font::MONOSPACE)
            .width(Length::Fill);
        if self.state.characteristic_editable() {
            characteristic_input = characteristic_input.on_input(Message::CharacteristicChanged);
        }

        let mut send_input = text_input("Text, or hex bytes such as AA BB CC", self.state.send_text())
            .on_input(Message::SendChanged)
            .width(Length::Fill);

        let mut send_button = button(text("Send"));
        if self.state.can_send() {
            send_input = send_input.on_submit(Message::Send);
            send_button = send_button.on_press(Message::Send);
        }

        let status = match self.state.link() {
            Link::Connected(session) => format!("Connected to {}", session.address()),
            Link::Connecting { address } => format!("Connecting to {}…", address),
            _ => match self.state.selected() {
                Some(address) => format!("Selected {}", address),
                None => "Not connected".to_string(),
            },
        };

        container(
            column![
                text("Devices").size(18),
                row![
                    scan_button,
                    Space::with_width(Length::Fill),
                    filter_input,
                ].align_items(Alignment::Center).spacing(10),
                self.device_table(),

                horizontal_rule(10),

                text("Connection").size(18),
                row![
                    text("Characteristic:"),
                    characteristic_input,
                    connect_button,
                ].align_items(Alignment::Center).spacing(10),
                text(status).style(SYSTEM_TEXT_COLOR),

                horizontal_rule(10),

                text("Received data").size(18),
                self.receive_log(),
                row![
                    send_input,
                    send_button,
                ].align_items(Alignment::Center).spacing(10),
            ]
                .spacing(10)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application(config: Config) -> Result<(), AppRunError> {
    let flags = ApplicationFlags { config };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("ble-debugger".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(760.0, 860.0);
    settings.window.min_size = Some(Size::new(560.0, 640.0));

    // this function will call process::exit() unless there was a startup error
    MyApplication::run(settings)?;
    Ok(())
}
