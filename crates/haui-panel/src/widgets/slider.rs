//! Horizontal slider: a gauge over a fixed integer range that can be set
//! by touching a column inside it.

use haui_core::SliderKind;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::Gauge,
};

use crate::theme;

/// Keyboard step for one arrow press.
pub fn step(kind: SliderKind) -> i64 {
    match kind {
        SliderKind::Brightness => 16,
        SliderKind::ColorTemp | SliderKind::Hue => 10,
        SliderKind::CoverPosition | SliderKind::FanPercentage => 5,
    }
}

/// Fraction of the track covered by `value`, in `0.0..=1.0`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn ratio(kind: SliderKind, value: i64) -> f64 {
    let (lo, hi) = kind.range();
    let span = (hi - lo).max(1) as f64;
    ((kind.clamp(value) - lo) as f64 / span).clamp(0.0, 1.0)
}

/// Value under a touched column. The first cell is the minimum and the
/// last cell the maximum.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::as_conversions
)]
pub fn value_at(kind: SliderKind, track: Rect, column: u16) -> i64 {
    let (lo, hi) = kind.range();
    if track.width <= 1 {
        return lo;
    }
    let offset = column.saturating_sub(track.x).min(track.width - 1);
    let fraction = f64::from(offset) / f64::from(track.width - 1);
    kind.clamp(lo + (fraction * (hi - lo) as f64).round() as i64)
}

/// Text drawn on the gauge.
pub fn label(kind: SliderKind, value: i64) -> String {
    match kind {
        SliderKind::Brightness => format!("{} {}%", kind.label(), (value * 100 + 127) / 255),
        SliderKind::ColorTemp => format!("{} {value} mired", kind.label()),
        SliderKind::Hue => format!("{} {value}°", kind.label()),
        SliderKind::CoverPosition | SliderKind::FanPercentage => {
            format!("{} {value}%", kind.label())
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, kind: SliderKind, value: i64, focused: bool) {
    let style = if focused {
        theme::gauge_focused()
    } else {
        theme::gauge()
    };
    let gauge = Gauge::default()
        .gauge_style(style)
        .use_unicode(true)
        .ratio(ratio(kind, value))
        .label(Span::styled(label(kind, value), Style::default().fg(theme::TEXT)));
    frame.render_widget(gauge, area);
}
