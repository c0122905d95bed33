//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(255, 183, 77); // #ffb74d
pub const TEAL: Color = Color::Rgb(100, 221, 203); // #64ddcb
pub const ON_YELLOW: Color = Color::Rgb(255, 224, 102); // #ffe066
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const WARN_AMBER: Color = Color::Rgb(241, 196, 15); // #f1c40f

pub const TEXT: Color = Color::Rgb(214, 217, 226); // #d6d9e2
pub const MUTED: Color = Color::Rgb(112, 121, 148); // #707994
pub const BG_PANEL: Color = Color::Rgb(27, 30, 38); // #1b1e26
pub const BG_SELECTED: Color = Color::Rgb(43, 48, 61); // #2b303d
pub const GAUGE_TRACK: Color = Color::Rgb(52, 57, 72); // #343948

pub fn title_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn group_active() -> Style {
    Style::default()
        .fg(BG_PANEL)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn group_inactive() -> Style {
    Style::default().fg(TEXT)
}

pub fn label() -> Style {
    Style::default().fg(TEXT)
}

pub fn row_selected() -> Style {
    Style::default().bg(BG_SELECTED).add_modifier(Modifier::BOLD)
}

/// Entity state text: lit when on or open, dim when off, red when the hub
/// can't reach the device.
pub fn state_style(state: &str) -> Style {
    match state {
        "on" | "open" | "opening" | "playing" | "home" => Style::default().fg(ON_YELLOW),
        "off" | "closed" | "closing" | "idle" | "paused" | "not_home" => {
            Style::default().fg(MUTED)
        }
        "unavailable" | "unknown" => Style::default().fg(ERROR_RED),
        _ => Style::default().fg(TEAL),
    }
}

pub fn gauge() -> Style {
    Style::default().fg(TEAL).bg(GAUGE_TRACK)
}

pub fn gauge_focused() -> Style {
    Style::default().fg(ACCENT).bg(GAUGE_TRACK)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}
