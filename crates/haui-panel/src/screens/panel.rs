//! Control panel: group tabs above the selected group's controls.
//!
//! ```text
//!  Living room   Kitchen   Sensors
//! ╭ Living room ─────────────────────────────╮
//! │ ☀ Ceiling                              on │
//! │   ████████████Brightness 45%░░░░░░░░░░░░  │
//! │   ██████████Temperature 300 mired░░░░░░░  │
//! │                                           │
//! │ ⏻ Heater plug                         off │
//! │                                           │
//! │ ° Target                      [-] 21 [+]  │
//! ╰───────────────────────────────────────────╯
//! ```
//!
//! Every drawn control records its area so touches can be hit-tested
//! against the last frame.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use haui_config::{Layout as PanelLayout, LayoutEntry, WidgetType};
use haui_core::command::number_text;
use haui_core::{Command, EntityId, EntityState, SliderKind, StepDirection};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use serde_json::Value;

use crate::action::Action;
use crate::component::Component;
use crate::event::{Touch, TouchKind};
use crate::theme;
use crate::widgets::{slider, status_indicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Prev,
    Next,
}

/// What a touch at a recorded area does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Group(usize),
    Header(usize),
    /// Entry index, slider index within the entry.
    Slider(usize, usize),
    Step(usize, StepDirection),
    Cycle(usize, Cycle),
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    area: Rect,
    target: Target,
}

/// Focused row: 0 is an entry's header, 1.. its sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Focus {
    entry: usize,
    row: usize,
}

pub struct PanelScreen {
    layout: PanelLayout,
    group: usize,
    focus: Focus,
    /// First entry drawn.
    scroll: usize,
    states: HashMap<EntityId, Arc<EntityState>>,
    /// Slider values sent but not yet confirmed by a state change.
    pending: HashMap<(EntityId, SliderKind), i64>,
    hits: Vec<Hit>,
}

impl PanelScreen {
    pub fn new(layout: PanelLayout) -> Self {
        Self {
            layout,
            group: 0,
            focus: Focus::default(),
            scroll: 0,
            states: HashMap::new(),
            pending: HashMap::new(),
            hits: Vec::new(),
        }
    }

    fn group_count(&self) -> usize {
        self.layout.groups.len()
    }

    fn entries(&self) -> &[LayoutEntry] {
        self.layout
            .groups
            .get_index(self.group)
            .map_or(&[], |(_, entries)| entries.as_slice())
    }

    fn state(&self, entity_id: &EntityId) -> Option<&EntityState> {
        self.states.get(entity_id).map(Arc::as_ref)
    }

    fn slider_value(&self, entity_id: &EntityId, kind: SliderKind) -> i64 {
        self.pending
            .get(&(entity_id.clone(), kind))
            .copied()
            .unwrap_or_else(|| kind.position(self.state(entity_id)))
    }

    // ── Focus ────────────────────────────────────────────────────────

    fn move_focus(&mut self, down: bool) {
        let entries = self.entries();
        let rows = |i: usize| entries.get(i).map_or(0, |e| e.sliders().len());
        let Focus { entry, row } = self.focus;

        let next = if down {
            if row < rows(entry) {
                Focus { entry, row: row + 1 }
            } else if entry + 1 < entries.len() {
                Focus {
                    entry: entry + 1,
                    row: 0,
                }
            } else {
                self.focus
            }
        } else if row > 0 {
            Focus { entry, row: row - 1 }
        } else if entry > 0 {
            Focus {
                entry: entry - 1,
                row: rows(entry - 1),
            }
        } else {
            self.focus
        };
        self.focus = next;
    }

    fn move_entry(&mut self, down: bool) {
        let len = self.entries().len();
        let entry = if down {
            (self.focus.entry + 1).min(len.saturating_sub(1))
        } else {
            self.focus.entry.saturating_sub(1)
        };
        self.focus = Focus { entry, row: 0 };
    }

    // ── Intents ──────────────────────────────────────────────────────

    /// Header press: toggle, open the chart, or advance a select.
    fn activate(&self, idx: usize) -> Option<Action> {
        let entry = self.entries().get(idx)?;
        match entry.widget_type {
            WidgetType::Light | WidgetType::Switch | WidgetType::Fan => {
                Some(Action::Send(Command::Toggle {
                    entity_id: entry.entity_id.clone(),
                }))
            }
            WidgetType::SensorChart => Some(Action::OpenChart(entry.entity_id.clone())),
            WidgetType::Select => self.cycle(idx, Cycle::Next),
            _ => None,
        }
    }

    /// Left/right on the focused row.
    fn adjust(&mut self, up: bool) -> Option<Action> {
        let Focus { entry: idx, row } = self.focus;
        let entry = self.entries().get(idx)?;

        if row > 0 {
            let kind = *entry.sliders().get(row - 1)?;
            let delta = if up { slider::step(kind) } else { -slider::step(kind) };
            let value = self.slider_value(&entry.entity_id, kind) + delta;
            return self.set_slider(idx, row - 1, value);
        }

        match entry.widget_type {
            WidgetType::Number => {
                let direction = if up {
                    StepDirection::Up
                } else {
                    StepDirection::Down
                };
                self.step(idx, direction)
            }
            WidgetType::Select => self.cycle(idx, if up { Cycle::Next } else { Cycle::Prev }),
            _ => None,
        }
    }

    fn set_slider(&mut self, idx: usize, slider: usize, value: i64) -> Option<Action> {
        let entry = self.entries().get(idx)?;
        let kind = *entry.sliders().get(slider)?;
        let entity_id = entry.entity_id.clone();
        let value = kind.clamp(value);

        if self.slider_value(&entity_id, kind) == value {
            return None;
        }
        self.pending.insert((entity_id.clone(), kind), value);
        Some(Action::Send(kind.command(entity_id, value)))
    }

    fn step(&self, idx: usize, direction: StepDirection) -> Option<Action> {
        let entry = self.entries().get(idx)?;
        Some(Action::Send(Command::StepNumber {
            entity_id: entry.entity_id.clone(),
            direction,
        }))
    }

    /// Pick the neighbouring option of a select, wrapping at the ends.
    fn cycle(&self, idx: usize, cycle: Cycle) -> Option<Action> {
        let entry = self.entries().get(idx)?;
        let state = self.state(&entry.entity_id)?;
        let options: Vec<&str> = state
            .attribute("options")
            .and_then(Value::as_array)
            .map(|opts| opts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if options.is_empty() {
            return None;
        }

        let len = options.len();
        let next = match options.iter().position(|o| *o == state.state) {
            Some(i) if cycle == Cycle::Next => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        let option = (*options.get(next)?).to_owned();
        Some(Action::Send(Command::SelectOption {
            entity_id: entry.entity_id.clone(),
            option,
        }))
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn group_block(&self) -> Block<'static> {
        let title = self
            .layout
            .groups
            .get_index(self.group)
            .map_or_else(String::new, |(name, _)| format!(" {name} "));
        Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default())
    }

    fn render_groups(&self, frame: &mut Frame, area: Rect, hits: &mut Vec<Hit>) {
        let mut x = area.x;
        let mut spans = Vec::new();

        for (i, name) in self.layout.groups.keys().enumerate() {
            let style = if i == self.group {
                theme::group_active()
            } else {
                theme::group_inactive()
            };
            let tab = Span::styled(format!(" {name} "), style);
            let width = u16::try_from(tab.width()).unwrap_or(u16::MAX);
            let visible = width.min(area.right().saturating_sub(x));
            if visible > 0 {
                hits.push(Hit {
                    area: Rect::new(x, area.y, visible, 1),
                    target: Target::Group(i),
                });
            }
            spans.push(tab);
            spans.push(Span::raw(" "));
            x = x.saturating_add(width).saturating_add(1);
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_entries(&self, frame: &mut Frame, area: Rect, hits: &mut Vec<Hit>) {
        let entries = self.entries();
        let mut y = area.y;

        for (idx, entry) in entries.iter().enumerate().skip(self.scroll) {
            let sliders = entry.sliders();
            let height = u16::try_from(sliders.len() + 1).unwrap_or(u16::MAX);
            if y.saturating_add(height) > area.bottom() {
                break;
            }

            self.render_header(frame, Rect::new(area.x, y, area.width, 1), idx, entry, hits);

            for (s, kind) in sliders.iter().enumerate() {
                let row = y + 1 + u16::try_from(s).unwrap_or(u16::MAX);
                let track = Rect::new(area.x + 2, row, area.width.saturating_sub(4), 1);
                let focused = self.focus == Focus { entry: idx, row: s + 1 };
                let value = self.slider_value(&entry.entity_id, *kind);
                slider::render(frame, track, *kind, value, focused);
                hits.push(Hit {
                    area: track,
                    target: Target::Slider(idx, s),
                });
            }

            y = y.saturating_add(height).saturating_add(1);
        }
    }

    fn render_header(
        &self,
        frame: &mut Frame,
        area: Rect,
        idx: usize,
        entry: &LayoutEntry,
        hits: &mut Vec<Hit>,
    ) {
        let state = self.state(&entry.entity_id);
        if self.focus == (Focus { entry: idx, row: 0 }) {
            frame.render_widget(Block::default().style(theme::row_selected()), area);
        }

        let name = entry
            .name
            .as_deref()
            .or_else(|| state.and_then(EntityState::friendly_name))
            .unwrap_or_else(|| entry.entity_id.as_str());
        let left = Line::from(vec![
            Span::styled(
                format!(" {} ", status_indicator::icon(&entry.info_type)),
                Style::default().fg(theme::ACCENT),
            ),
            Span::styled(name.to_owned(), theme::label()),
        ]);

        let right = Line::from(header_value(entry, state));
        let right_width = u16::try_from(right.width())
            .unwrap_or(u16::MAX)
            .min(area.width.saturating_sub(1));
        let right_area = Rect::new(
            area.right().saturating_sub(right_width + 1),
            area.y,
            right_width,
            1,
        );
        let left_area = Rect::new(
            area.x,
            area.y,
            area.width.saturating_sub(right_width + 2),
            1,
        );

        frame.render_widget(Paragraph::new(left), left_area);
        frame.render_widget(Paragraph::new(right), right_area);

        // Inline buttons first so they win over the header itself.
        let ends = |w: u16| {
            (
                Rect::new(right_area.x, area.y, w.min(right_area.width), 1),
                Rect::new(right_area.right().saturating_sub(w), area.y, w.min(right_area.width), 1),
            )
        };
        match entry.widget_type {
            WidgetType::Number if state.is_some() => {
                let (down, up) = ends(3);
                hits.push(Hit {
                    area: down,
                    target: Target::Step(idx, StepDirection::Down),
                });
                hits.push(Hit {
                    area: up,
                    target: Target::Step(idx, StepDirection::Up),
                });
            }
            WidgetType::Select if state.is_some() => {
                let (prev, next) = ends(2);
                hits.push(Hit {
                    area: prev,
                    target: Target::Cycle(idx, Cycle::Prev),
                });
                hits.push(Hit {
                    area: next,
                    target: Target::Cycle(idx, Cycle::Next),
                });
            }
            _ => {}
        }
        hits.push(Hit {
            area,
            target: Target::Header(idx),
        });
    }
}

/// Right-hand text of an entry header.
fn header_value(entry: &LayoutEntry, state: Option<&EntityState>) -> Vec<Span<'static>> {
    let Some(state) = state else {
        return vec![Span::styled("…", theme::key_hint())];
    };
    let styled = |text: String| Span::styled(text, theme::state_style(&state.state));

    match entry.widget_type {
        WidgetType::Number => {
            let unit = state.unit().map(|u| format!(" {u}")).unwrap_or_default();
            vec![
                Span::styled("[-]", theme::key_hint_key()),
                styled(format!(" {}{unit} ", number_text(state))),
                Span::styled("[+]", theme::key_hint_key()),
            ]
        }
        WidgetType::Select => vec![
            Span::styled("‹ ", theme::key_hint_key()),
            styled(state.state.clone()),
            Span::styled(" ›", theme::key_hint_key()),
        ],
        WidgetType::Sensor | WidgetType::BinarySensor => {
            vec![styled(entry.sensor_kind().text(state))]
        }
        WidgetType::SensorChart => vec![
            styled(entry.sensor_kind().text(state)),
            Span::styled(" ▸", theme::key_hint_key()),
        ],
        _ => vec![styled(state.state.clone())],
    }
}

/// First entry to draw so the focused one fits in `viewport` rows.
/// Entries are separated by one blank row.
fn scroll_for(heights: &[usize], focused: usize, current: usize, viewport: usize) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let focused = focused.min(heights.len() - 1);
    let mut scroll = current.min(focused);
    while scroll < focused {
        let used: usize = heights
            .get(scroll..=focused)
            .map_or(0, |hs| hs.iter().map(|h| h + 1).sum::<usize>() - 1);
        if used <= viewport {
            break;
        }
        scroll += 1;
    }
    scroll
}

impl Component for PanelScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let groups = self.group_count();
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_focus(false);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_focus(true);
                None
            }
            KeyCode::PageUp => {
                self.move_entry(false);
                None
            }
            KeyCode::PageDown => {
                self.move_entry(true);
                None
            }
            KeyCode::Left | KeyCode::Char('h' | '-') => self.adjust(false),
            KeyCode::Right | KeyCode::Char('l' | '+') => self.adjust(true),
            KeyCode::Enter | KeyCode::Char(' ') if self.focus.row == 0 => {
                self.activate(self.focus.entry)
            }
            KeyCode::Tab if groups > 0 => Some(Action::SelectGroup((self.group + 1) % groups)),
            KeyCode::BackTab if groups > 0 => {
                Some(Action::SelectGroup((self.group + groups - 1) % groups))
            }
            KeyCode::Char(c @ '1'..='9') => c
                .to_digit(10)
                .and_then(|d| usize::try_from(d).ok())
                .map(|d| d - 1)
                .filter(|g| *g < groups)
                .map(Action::SelectGroup),
            _ => None,
        };
        Ok(action)
    }

    fn handle_touch(&mut self, touch: Touch) -> Result<Option<Action>> {
        match touch.kind {
            TouchKind::ScrollUp => {
                self.move_entry(false);
                return Ok(None);
            }
            TouchKind::ScrollDown => {
                self.move_entry(true);
                return Ok(None);
            }
            TouchKind::Press | TouchKind::Drag => {}
        }

        let pos = Position::new(touch.column, touch.row);
        let Some(hit) = self.hits.iter().find(|h| h.area.contains(pos)).copied() else {
            return Ok(None);
        };

        let action = match (touch.kind, hit.target) {
            // Dragging along a slider keeps sending; the client debounces.
            (_, Target::Slider(idx, s)) => {
                self.focus = Focus { entry: idx, row: s + 1 };
                let kind = self
                    .entries()
                    .get(idx)
                    .and_then(|e| e.sliders().get(s).copied());
                kind.and_then(|kind| {
                    self.set_slider(idx, s, slider::value_at(kind, hit.area, touch.column))
                })
            }
            (TouchKind::Press, Target::Group(g)) => Some(Action::SelectGroup(g)),
            (TouchKind::Press, Target::Header(idx)) => {
                self.focus = Focus { entry: idx, row: 0 };
                self.activate(idx)
            }
            (TouchKind::Press, Target::Step(idx, direction)) => {
                self.focus = Focus { entry: idx, row: 0 };
                self.step(idx, direction)
            }
            (TouchKind::Press, Target::Cycle(idx, cycle)) => {
                self.focus = Focus { entry: idx, row: 0 };
                self.cycle(idx, cycle)
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateChanged { entity_id, state } => {
                self.pending.retain(|(id, _), _| id != entity_id);
                self.states.insert(entity_id.clone(), Arc::clone(state));
            }
            Action::SelectGroup(group) if *group < self.group_count() => {
                if *group != self.group {
                    self.group = *group;
                    self.focus = Focus::default();
                    self.scroll = 0;
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [tabs_area, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);

        if self.layout.is_empty() {
            self.hits.clear();
            let block = self.group_block();
            let inner = block.inner(body);
            frame.render_widget(block, body);
            frame.render_widget(
                Paragraph::new("  No widgets configured. Set `layout` in your profile.")
                    .style(theme::key_hint()),
                inner,
            );
            return;
        }

        let block = self.group_block();
        let inner = block.inner(body);

        let heights: Vec<usize> = self.entries().iter().map(|e| e.sliders().len() + 1).collect();
        self.scroll = scroll_for(
            &heights,
            self.focus.entry,
            self.scroll,
            usize::from(inner.height),
        );

        let mut hits = Vec::new();
        self.render_groups(frame, tabs_area, &mut hits);
        frame.render_widget(block, body);
        self.render_entries(frame, inner, &mut hits);
        self.hits = hits;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;

    const LAYOUT: &str = r#"{
        "Living room": [
            { "entity_id": "light.ceiling", "widget_type": "light", "info_type": "temp", "name": "Ceiling" },
            { "entity_id": "switch.heater", "widget_type": "switch", "info_type": "switch", "name": "Heater plug" },
            { "entity_id": "number.target", "widget_type": "number", "info_type": "temperature", "name": "Target" },
            { "entity_id": "select.mode", "widget_type": "select", "info_type": "list", "name": "Mode" }
        ],
        "Sensors": [
            { "entity_id": "sensor.outdoor", "widget_type": "sensor_chart", "info_type": "temperature", "name": "Outdoor" }
        ]
    }"#;

    fn screen() -> PanelScreen {
        let mut screen = PanelScreen::new(PanelLayout::parse(LAYOUT).unwrap());
        apply(&mut screen, "light.ceiling", EntityState::new("on").with_attribute("brightness", 100));
        apply(&mut screen, "switch.heater", EntityState::new("off"));
        apply(
            &mut screen,
            "number.target",
            EntityState::new("21").with_attribute("unit_of_measurement", "°C"),
        );
        apply(
            &mut screen,
            "select.mode",
            EntityState::new("eco").with_attribute("options", json!(["comfort", "eco", "away"])),
        );
        screen
    }

    fn apply(screen: &mut PanelScreen, id: &str, state: EntityState) {
        screen
            .update(&Action::StateChanged {
                entity_id: id.into(),
                state: Arc::new(state),
            })
            .unwrap();
    }

    fn press(screen: &mut PanelScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn send(cmd: Command) -> Option<Action> {
        Some(Action::Send(cmd))
    }

    #[test]
    fn arrows_move_a_slider_from_its_pending_value() {
        let mut s = screen();
        press(&mut s, KeyCode::Down);

        assert_eq!(
            press(&mut s, KeyCode::Right),
            send(Command::SetBrightness {
                entity_id: "light.ceiling".into(),
                value: 116
            })
        );
        assert_eq!(
            press(&mut s, KeyCode::Right),
            send(Command::SetBrightness {
                entity_id: "light.ceiling".into(),
                value: 132
            })
        );

        // A state change from the hub replaces the pending value.
        apply(&mut s, "light.ceiling", EntityState::new("on").with_attribute("brightness", 10));
        assert_eq!(
            press(&mut s, KeyCode::Left),
            send(Command::SetBrightness {
                entity_id: "light.ceiling".into(),
                value: 0
            })
        );
        // Already at the bottom of the range: nothing to send.
        assert_eq!(press(&mut s, KeyCode::Left), None);
    }

    #[test]
    fn enter_on_a_switch_toggles_it() {
        let mut s = screen();
        // header, brightness, color temp, then the switch header
        for _ in 0..3 {
            press(&mut s, KeyCode::Down);
        }
        assert_eq!(
            press(&mut s, KeyCode::Enter),
            send(Command::Toggle {
                entity_id: "switch.heater".into()
            })
        );
    }

    #[test]
    fn number_steps_and_select_cycles() {
        let mut s = screen();
        for _ in 0..4 {
            press(&mut s, KeyCode::Down);
        }
        assert_eq!(
            press(&mut s, KeyCode::Char('+')),
            send(Command::StepNumber {
                entity_id: "number.target".into(),
                direction: StepDirection::Up
            })
        );

        press(&mut s, KeyCode::Down);
        assert_eq!(
            press(&mut s, KeyCode::Right),
            send(Command::SelectOption {
                entity_id: "select.mode".into(),
                option: "away".into()
            })
        );
        assert_eq!(
            press(&mut s, KeyCode::Left),
            send(Command::SelectOption {
                entity_id: "select.mode".into(),
                option: "comfort".into()
            })
        );

        apply(
            &mut s,
            "select.mode",
            EntityState::new("away").with_attribute("options", json!(["comfort", "eco", "away"])),
        );
        assert_eq!(
            press(&mut s, KeyCode::Enter),
            send(Command::SelectOption {
                entity_id: "select.mode".into(),
                option: "comfort".into()
            })
        );
    }

    #[test]
    fn groups_switch_and_charts_open() {
        let mut s = screen();
        assert_eq!(press(&mut s, KeyCode::Tab), Some(Action::SelectGroup(1)));
        s.update(&Action::SelectGroup(1)).unwrap();
        assert_eq!(
            press(&mut s, KeyCode::Enter),
            Some(Action::OpenChart("sensor.outdoor".into()))
        );

        assert_eq!(press(&mut s, KeyCode::Char('1')), Some(Action::SelectGroup(0)));
        assert_eq!(press(&mut s, KeyCode::Char('3')), None);

        // Out-of-range groups are ignored.
        s.update(&Action::SelectGroup(5)).unwrap();
        assert_eq!(s.group, 1);
    }

    #[test]
    fn render_draws_controls_and_touches_hit_them() {
        let mut s = screen();
        let mut terminal = Terminal::new(TestBackend::new(50, 20)).unwrap();
        terminal.draw(|f| s.render(f, f.area())).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Living room"));
        assert!(text.contains("Ceiling"));
        assert!(text.contains("Brightness 39%"));
        assert!(text.contains("[-] 21 °C [+]"));

        let track = s
            .hits
            .iter()
            .find(|h| h.target == Target::Slider(0, 0))
            .unwrap()
            .area;
        let touch = Touch {
            kind: TouchKind::Drag,
            column: track.right() - 1,
            row: track.y,
        };
        assert_eq!(
            s.handle_touch(touch).unwrap(),
            send(Command::SetBrightness {
                entity_id: "light.ceiling".into(),
                value: 255
            })
        );

        let up = s
            .hits
            .iter()
            .find(|h| h.target == Target::Step(2, StepDirection::Up))
            .unwrap()
            .area;
        let touch = Touch {
            kind: TouchKind::Press,
            column: up.x,
            row: up.y,
        };
        assert_eq!(
            s.handle_touch(touch).unwrap(),
            send(Command::StepNumber {
                entity_id: "number.target".into(),
                direction: StepDirection::Up
            })
        );

        let sensors = s
            .hits
            .iter()
            .find(|h| h.target == Target::Group(1))
            .unwrap()
            .area;
        let touch = Touch {
            kind: TouchKind::Press,
            column: sensors.x,
            row: sensors.y,
        };
        assert_eq!(s.handle_touch(touch).unwrap(), Some(Action::SelectGroup(1)));
    }

    #[test]
    fn empty_layout_renders_a_hint() {
        let mut s = PanelScreen::new(PanelLayout::default());
        let mut terminal = Terminal::new(TestBackend::new(70, 6)).unwrap();
        terminal.draw(|f| s.render(f, f.area())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("No widgets configured"));
        assert_eq!(press(&mut s, KeyCode::Tab), None);
        assert_eq!(press(&mut s, KeyCode::Enter), None);
    }

    #[test]
    fn scroll_keeps_focus_in_view() {
        // entries of 3, 1, 1, 1 rows with a blank row between them
        let heights = [3, 1, 1, 1];
        assert_eq!(scroll_for(&heights, 0, 0, 4), 0);
        assert_eq!(scroll_for(&heights, 1, 0, 5), 0);
        assert_eq!(scroll_for(&heights, 1, 0, 4), 1);
        assert_eq!(scroll_for(&heights, 3, 0, 3), 2);
        // scrolling back up follows the focus
        assert_eq!(scroll_for(&heights, 0, 2, 3), 0);
        assert_eq!(scroll_for(&[], 4, 2, 10), 0);
    }
}
