//! Connection status and per-entity glyphs.

use haui_core::ConnectionState;
use ratatui::style::Style;
use ratatui::text::Span;

use crate::theme;

pub fn connection_span(state: ConnectionState) -> Span<'static> {
    let (text, color) = match state {
        ConnectionState::Authenticated => ("● connected", theme::SUCCESS_GREEN),
        ConnectionState::Connected => ("◐ authenticating", theme::WARN_AMBER),
        ConnectionState::Connecting => ("◐ connecting", theme::WARN_AMBER),
        ConnectionState::Disconnected => ("○ disconnected", theme::ERROR_RED),
    };
    Span::styled(text, Style::default().fg(color))
}

/// Glyph for a layout `info_type`.
pub fn icon(info_type: &str) -> &'static str {
    match info_type {
        "light" | "temp" | "temp_color" => "☀",
        "switch" => "⏻",
        "temperature" => "°",
        "humidity" | "humadity" => "≈",
        "window" => "▯",
        "doors" | "door" => "▮",
        "cover" => "▤",
        "presence" => "◎",
        "fan" => "✣",
        "audio" => "♪",
        "list" => "☰",
        _ => "·",
    }
}
