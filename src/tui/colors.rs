//! Color palettes for the terminal user interface.

use ratatui::style::Color;

/// Used for High priority and overdue deadlines
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Used for the focused form field
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Used for completed rows and success toasts
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);

/// Colors for one theme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub accent_fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub high: Color,
    pub medium: Color,
    pub low: Color,
    pub overdue: Color,
    pub done: Color,
    pub focus: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        bg: Color::Reset,
        fg: Color::Black,
        muted: Color::DarkGray,
        accent: Color::Blue,
        accent_fg: Color::White,
        highlight_bg: Color::Gray,
        highlight_fg: Color::Black,
        high: DARK_RED,
        medium: Color::Rgb(160, 100, 0),
        low: DARK_GREEN,
        overdue: Color::Red,
        done: Color::DarkGray,
        focus: Color::Blue,
    };

    pub const DARK: Palette = Palette {
        bg: Color::Rgb(24, 24, 32),
        fg: Color::White,
        muted: Color::Gray,
        accent: Color::Rgb(86, 60, 92),
        accent_fg: Color::White,
        highlight_bg: Color::Rgb(60, 60, 80),
        highlight_fg: Color::White,
        high: Color::LightRed,
        medium: GOLD,
        low: Color::LightGreen,
        overdue: Color::LightRed,
        done: Color::DarkGray,
        focus: GOLD,
    };

    pub fn for_mode(dark: bool) -> Palette {
        if dark {
            Palette::DARK
        } else {
            Palette::LIGHT
        }
    }
}
