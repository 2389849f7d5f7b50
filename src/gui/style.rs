use iced::{Background, Border, Color, Shadow, Theme};
use iced::widget::button::{StyleSheet, Appearance};

pub const SYSTEM_TEXT_COLOR: Color = Color { r: 0.45, g: 0.45, b: 0.45, a: 1.0 };
pub const ERROR_TEXT_COLOR: Color = Color { r: 0.8, g: 0.1, b: 0.1, a: 1.0 };
pub const RECEIVED_TEXT_COLOR: Color = Color::BLACK;

const SELECTED_ROW_COLOR: Color = Color { r: 0.0, g: 0.45, b: 0.55, a: 1.0 };
const HOVERED_ROW_COLOR: Color = Color { r: 0.9, g: 0.93, b: 0.95, a: 1.0 };

/// A flat table row, highlighted when selected.
pub struct DeviceRowStyleSheet {
    pub selected: bool,
}

impl StyleSheet for DeviceRowStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> Appearance {
        Appearance {
            shadow_offset: Default::default(),
            background: if self.selected { Some(Background::Color(SELECTED_ROW_COLOR)) } else { None },
            text_color: if self.selected { Color::WHITE } else { Color::BLACK },
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }

    fn hovered(&self, style: &Self::Style) -> Appearance {
        let active = self.active(style);

        if self.selected {
            return active;
        }

        Appearance {
            background: Some(Background::Color(HOVERED_ROW_COLOR)),
            ..active
        }
    }
}
