use iced::font::Weight;
use iced::widget::{button, container, Space};
use iced::{Background, Border, Color, Element, Fill, Font, Shadow, Vector};

use hello_dapp_core::StatusKind;

use crate::{ACTIVE, BORDER, MUTED, PRIMARY, SURFACE};

pub const SUCCESS: Color = Color::from_rgb(0.059, 0.757, 0.718);
pub const DANGER: Color = Color::from_rgb(0.906, 0.192, 0.192);
pub const WARNING: Color = Color::from_rgb(1.0, 0.757, 0.027);
const TEXT: Color = Color::from_rgb(0.85, 0.87, 0.90);

pub const BOLD: Font = Font {
    weight: Weight::Bold,
    ..Font::DEFAULT
};

/// Status line color by category.
pub fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Disconnected | StatusKind::Prompt => WARNING,
        StatusKind::Connected => TEXT,
        StatusKind::Pending => MUTED,
        StatusKind::Success => SUCCESS,
        StatusKind::Error => DANGER,
    }
}

// -- Containers --

pub fn card(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(SURFACE)),
        border: Border {
            color: BORDER,
            width: 1.0,
            radius: 12.0.into(),
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.15),
            offset: Vector::new(0.0, 2.0),
            blur_radius: 8.0,
        },
        ..Default::default()
    }
}

/// Network badge in the header.
pub fn pill(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(ACTIVE)),
        border: Border {
            radius: 20.0.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

// -- Buttons --

fn rounded() -> Border {
    Border {
        radius: 8.0.into(),
        ..Default::default()
    }
}

pub fn btn_primary(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let background = match status {
        button::Status::Active => PRIMARY,
        button::Status::Hovered => Color::from_rgb(1.0, 0.60, 0.25),
        button::Status::Pressed => Color::from_rgb(0.85, 0.44, 0.10),
        button::Status::Disabled => {
            return button::Style {
                background: Some(Background::Color(Color::from_rgb(0.15, 0.19, 0.25))),
                text_color: Color::from_rgba(1.0, 1.0, 1.0, 0.35),
                border: rounded(),
                ..Default::default()
            }
        }
    };
    button::Style {
        background: Some(Background::Color(background)),
        text_color: Color::WHITE,
        border: rounded(),
        ..Default::default()
    }
}

pub fn btn_secondary(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let border = Border {
        color: BORDER,
        width: 1.0,
        radius: 8.0.into(),
    };
    match status {
        button::Status::Hovered | button::Status::Pressed => button::Style {
            background: Some(Background::Color(ACTIVE)),
            text_color: Color::WHITE,
            border,
            ..Default::default()
        },
        button::Status::Disabled => button::Style {
            text_color: Color::from_rgba(1.0, 1.0, 1.0, 0.3),
            border,
            ..Default::default()
        },
        button::Status::Active => button::Style {
            background: Some(Background::Color(Color::TRANSPARENT)),
            text_color: TEXT,
            border,
            ..Default::default()
        },
    }
}

pub fn btn_link(_theme: &iced::Theme, status: button::Status) -> button::Style {
    button::Style {
        background: None,
        text_color: match status {
            button::Status::Hovered => Color::WHITE,
            _ => PRIMARY,
        },
        ..Default::default()
    }
}

// -- Helpers --

pub fn separator<'a, M: 'a>() -> Element<'a, M> {
    container(Space::new())
        .width(Fill)
        .height(1)
        .style(|_theme| container::Style {
            background: Some(Background::Color(Color::from_rgba(
                0.204, 0.259, 0.337, 0.5,
            ))),
            ..Default::default()
        })
        .into()
}
