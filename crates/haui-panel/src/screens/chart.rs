//! History chart for one sensor, shown over the panel.
//!
//! Numeric sensors plot a line. Binary sensors (doors, windows) plot a
//! step between 0 and 1 held until the moment the data was fetched.
//! The app refreshes the series while the chart is open.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use haui_core::history::DEFAULT_WINDOW;
use haui_core::{EntityId, HistorySeries};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph},
};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Touch, TouchKind};
use crate::theme;

const CLOSE_LABEL: &str = "[ close ]";

pub struct ChartScreen {
    entity_id: EntityId,
    series: Option<Arc<HistorySeries>>,
    loading: bool,
    error: Option<String>,
    updated: Option<DateTime<Utc>>,
    close_area: Rect,
}

impl ChartScreen {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            series: None,
            loading: true,
            error: None,
            updated: None,
            close_area: Rect::default(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn set_loading(&mut self) {
        self.loading = true;
    }

    fn title(&self) -> String {
        let name = self
            .series
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or_else(|| self.entity_id.as_str());
        let hours = DEFAULT_WINDOW.as_secs() / 3600;
        format!(" {name} · last {hours} h ")
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect, block: Block) {
        let message = match (&self.series, &self.error) {
            (_, Some(err)) => Some(format!("  History unavailable: {err}")),
            (None, None) => Some("  Loading history…".to_owned()),
            (Some(series), None) if series.is_empty() => {
                Some("  No history recorded in this window".to_owned())
            }
            (Some(_), None) => None,
        };
        let series = match (&self.series, message) {
            (Some(series), None) => series,
            (_, message) => {
                let inner = block.inner(area);
                frame.render_widget(block, area);
                frame.render_widget(
                    Paragraph::new(message.unwrap_or_default()).style(theme::key_hint()),
                    inner,
                );
                return;
            }
        };

        let points = chart_points(series, self.updated);
        let [x_lo, x_hi] = x_bounds(&points);
        let [y_lo, y_hi] = y_bounds(series);

        let y_labels: Vec<String> = if series.binary {
            vec!["Closed".into(), "Open".into()]
        } else {
            let unit = series.unit.as_deref().unwrap_or("");
            [y_lo, (y_lo + y_hi) / 2.0, y_hi]
                .iter()
                .map(|v| format!("{v:.1}{unit}"))
                .collect()
        };
        let x_labels: Vec<String> = [x_lo, (x_lo + x_hi) / 2.0, x_hi]
            .iter()
            .map(|x| time_label(*x))
            .collect();

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::TEAL))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .style(theme::key_hint())
                    .bounds([x_lo, x_hi])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(theme::key_hint())
                    .bounds([y_lo, y_hi])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn status_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(latest) = self.series.as_deref().and_then(latest_text) {
            spans.push(Span::styled(" latest ", theme::key_hint()));
            spans.push(Span::styled(latest, theme::label()));
        }
        if let Some(updated) = self.updated {
            let at = updated.with_timezone(&Local).format("%H:%M:%S");
            spans.push(Span::styled(format!("  updated {at}"), theme::key_hint()));
        }
        if self.loading && self.series.is_some() {
            spans.push(Span::styled("  refreshing…", theme::key_hint()));
        }
        spans.push(Span::styled("  r ", theme::key_hint_key()));
        spans.push(Span::styled("refresh", theme::key_hint()));
        spans.push(Span::styled("  Esc ", theme::key_hint_key()));
        spans.push(Span::styled("close", theme::key_hint()));
        Line::from(spans)
    }
}

fn latest_text(series: &HistorySeries) -> Option<String> {
    let point = series.latest()?;
    let text = match (series.binary, point.value > 0.5) {
        (true, true) => "Open".to_owned(),
        (true, false) => "Closed".to_owned(),
        (false, _) => format!("{}{}", point.value, series.unit.as_deref().unwrap_or("")),
    };
    Some(text)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn epoch(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn time_label(x: f64) -> String {
    DateTime::from_timestamp(x as i64, 0).map_or_else(String::new, |t| {
        t.with_timezone(&Local).format("%H:%M").to_string()
    })
}

/// Plot points. Binary series repeat the previous value at each change so
/// the line steps, and hold the last value until `until`.
fn chart_points(series: &HistorySeries, until: Option<DateTime<Utc>>) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(series.points.len() * 2 + 1);
    let mut prev: Option<f64> = None;

    for point in &series.points {
        let x = epoch(point.at);
        if let (true, Some(v)) = (series.binary, prev) {
            out.push((x, v));
        }
        out.push((x, point.value));
        prev = Some(point.value);
    }

    if let (true, Some(v), Some(until)) = (series.binary, prev, until) {
        let x = epoch(until);
        if out.last().is_some_and(|(last, _)| x > *last) {
            out.push((x, v));
        }
    }
    out
}

fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let lo = points.first().map_or(0.0, |(x, _)| *x);
    let hi = points.last().map_or(1.0, |(x, _)| *x);
    if hi - lo < 1.0 { [lo, lo + 1.0] } else { [lo, hi] }
}

/// Vertical range with a margin so the line never sits on the border.
fn y_bounds(series: &HistorySeries) -> [f64; 2] {
    if series.binary {
        return [-0.1, 1.1];
    }
    match series.bounds() {
        Some((lo, hi)) => {
            let span = hi - lo;
            let pad = if span < f64::EPSILON { 1.0 } else { span * 0.1 };
            [lo - pad, hi + pad]
        }
        None => [0.0, 1.0],
    }
}

impl Component for ChartScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => Some(Action::CloseChart),
            KeyCode::Char('r') => Some(Action::RefreshChart),
            _ => None,
        })
    }

    fn handle_touch(&mut self, touch: Touch) -> Result<Option<Action>> {
        let on_close = self
            .close_area
            .contains(Position::new(touch.column, touch.row));
        Ok((touch.kind == TouchKind::Press && on_close).then_some(Action::CloseChart))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ChartLoaded(series) if series.entity_id == self.entity_id => {
                self.series = Some(Arc::clone(series));
                self.error = None;
                self.loading = false;
                self.updated = Some(Utc::now());
            }
            Action::ChartFailed(message) => {
                self.error = Some(message.clone());
                self.loading = false;
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [chart_area, status_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let block = Block::default()
            .title(self.title())
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_PANEL));
        self.render_chart(frame, chart_area, block);

        let close_width = u16::try_from(CLOSE_LABEL.len()).unwrap_or(u16::MAX);
        self.close_area = Rect::new(
            status_area.right().saturating_sub(close_width),
            status_area.y,
            close_width.min(status_area.width),
            1,
        );
        frame.render_widget(Paragraph::new(self.status_line()), status_area);
        frame.render_widget(
            Paragraph::new(Span::styled(CLOSE_LABEL, theme::key_hint_key())),
            self.close_area,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crossterm::event::KeyModifiers;
    use haui_core::HistoryPoint;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap()
    }

    fn series(binary: bool, values: &[(u32, f64)]) -> HistorySeries {
        HistorySeries {
            entity_id: "sensor.outdoor".into(),
            name: Some("Outdoor".into()),
            unit: (!binary).then(|| "°C".into()),
            binary,
            points: values
                .iter()
                .map(|(m, v)| HistoryPoint {
                    at: at(*m),
                    value: *v,
                })
                .collect(),
        }
    }

    fn screen_text(screen: &mut ChartScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| screen.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn binary_series_steps_and_holds() {
        let s = series(true, &[(0, 0.0), (10, 1.0), (20, 0.0)]);
        let t = |m| epoch(at(m));
        assert_eq!(
            chart_points(&s, Some(at(30))),
            vec![
                (t(0), 0.0),
                (t(10), 0.0),
                (t(10), 1.0),
                (t(20), 1.0),
                (t(20), 0.0),
                (t(30), 0.0),
            ]
        );
    }

    #[test]
    fn numeric_series_is_plotted_as_is() {
        let s = series(false, &[(0, 20.0), (10, 22.0)]);
        assert_eq!(
            chart_points(&s, Some(at(30))),
            vec![(epoch(at(0)), 20.0), (epoch(at(10)), 22.0)]
        );
    }

    #[test]
    fn y_bounds_pad_the_range() {
        let s = series(false, &[(0, 20.0), (10, 30.0)]);
        assert_eq!(y_bounds(&s), [19.0, 31.0]);

        let flat = series(false, &[(0, 5.0), (10, 5.0)]);
        assert_eq!(y_bounds(&flat), [4.0, 6.0]);

        assert_eq!(y_bounds(&series(true, &[])), [-0.1, 1.1]);
        assert_eq!(y_bounds(&series(false, &[])), [0.0, 1.0]);
    }

    #[test]
    fn x_bounds_never_collapse() {
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
        assert_eq!(x_bounds(&[(50.0, 1.0)]), [50.0, 51.0]);
        assert_eq!(x_bounds(&[(50.0, 1.0), (80.0, 2.0)]), [50.0, 80.0]);
    }

    #[test]
    fn loaded_series_replaces_loading_message() {
        let mut screen = ChartScreen::new("sensor.outdoor".into());
        assert!(screen_text(&mut screen).contains("Loading history"));

        let loaded = Arc::new(series(false, &[(0, 20.0), (10, 22.5)]));
        screen.update(&Action::ChartLoaded(loaded)).unwrap();
        let text = screen_text(&mut screen);
        assert!(text.contains("Outdoor"));
        assert!(text.contains("latest 22.5°C"));
        assert!(!text.contains("Loading history"));
    }

    #[test]
    fn series_for_another_entity_is_ignored() {
        let mut screen = ChartScreen::new("sensor.kitchen".into());
        let other = Arc::new(series(false, &[(0, 20.0)]));
        screen.update(&Action::ChartLoaded(other)).unwrap();
        assert!(screen.series.is_none());

        screen
            .update(&Action::ChartFailed("HTTP 500".into()))
            .unwrap();
        assert!(screen_text(&mut screen).contains("History unavailable: HTTP 500"));
    }

    #[test]
    fn keys_and_close_button() {
        let mut screen = ChartScreen::new("sensor.outdoor".into());
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::CloseChart)
        );
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char('r'))).unwrap(),
            Some(Action::RefreshChart)
        );

        screen_text(&mut screen);
        let close = screen.close_area;
        let press = |column, row| Touch {
            kind: TouchKind::Press,
            column,
            row,
        };
        assert_eq!(
            screen.handle_touch(press(close.x, close.y)).unwrap(),
            Some(Action::CloseChart)
        );
        assert_eq!(screen.handle_touch(press(0, 0)).unwrap(), None);
    }
}
