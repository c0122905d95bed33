//! Application core: event loop, action dispatch, overlays.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use haui_config::Layout as PanelLayout;
use haui_core::history::{DEFAULT_WINDOW, REFRESH_INTERVAL};
use haui_core::{ConnectionState, HistoryClient, HubClient};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader, Touch, TouchKind};
use crate::screens::chart::ChartScreen;
use crate::screens::panel::PanelScreen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::status_indicator;

const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

pub struct App {
    client: HubClient,
    history: Option<Arc<HistoryClient>>,
    panel: PanelScreen,
    /// Open history chart; drawn instead of the panel.
    chart: Option<ChartScreen>,
    running: bool,
    connection: ConnectionState,
    entity_count: usize,
    help_visible: bool,
    /// Kiosk mode: no status bar.
    fullscreen: bool,
    notification: Option<(Notification, Instant)>,
    chart_fetched: Option<Instant>,
    /// Bumped on every history request and on close, so late responses
    /// for a chart that is gone are dropped.
    chart_generation: Arc<AtomicU64>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(
        client: HubClient,
        history: Option<HistoryClient>,
        layout: PanelLayout,
        fullscreen: bool,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            client,
            history: history.map(Arc::new),
            panel: PanelScreen::new(layout),
            chart: None,
            running: true,
            connection: ConnectionState::Disconnected,
            entity_count: 0,
            help_visible: false,
            fullscreen,
            notification: None,
            chart_fetched: None,
            chart_generation: Arc::new(AtomicU64::new(0)),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        debug!(size = ?tui.size().unwrap_or((80, 24)), "terminal ready");

        let client = self.client.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(client, tx, cancel).await;
        });

        let mut events = EventReader::new(
            Duration::from_millis(250), // housekeeping
            Duration::from_millis(50),  // 20 FPS is plenty for a wall panel
        );

        info!("panel event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Touch(touch) => {
                    if let Some(action) = self.handle_touch(touch)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if action == Action::Render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        tui.exit();
        info!("panel event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        if key.code == KeyCode::Char('?') {
            return Ok(Some(Action::ToggleHelp));
        }

        if let Some(chart) = self.chart.as_mut() {
            return chart.handle_key_event(key);
        }

        if key.code == KeyCode::Char('q') {
            return Ok(Some(Action::Quit));
        }

        self.panel.handle_key_event(key)
    }

    fn handle_touch(&mut self, touch: Touch) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok((touch.kind == TouchKind::Press).then_some(Action::ToggleHelp));
        }
        if touch.kind == TouchKind::Press && self.notification.is_some() {
            // Any tap also clears the toast.
            self.action_tx.send(Action::DismissNotification)?;
        }
        match self.chart.as_mut() {
            Some(chart) => chart.handle_touch(touch),
            None => self.panel.handle_touch(touch),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Tick => self.on_tick(),

            Action::ConnectionChanged(state) => {
                if *state != self.connection {
                    info!(from = %self.connection, to = %state, "hub connection changed");
                }
                match (self.connection, *state) {
                    (ConnectionState::Authenticated, ConnectionState::Disconnected) => {
                        self.notify(Notification::info("Connection lost, reconnecting"));
                    }
                    (
                        ConnectionState::Connecting | ConnectionState::Connected,
                        ConnectionState::Authenticated,
                    ) if self.entity_count > 0 => {
                        self.notify(Notification::success("Reconnected to the hub"));
                    }
                    _ => {}
                }
                self.connection = *state;
            }

            Action::SnapshotApplied(count) => {
                info!(count, "state snapshot applied");
                self.entity_count = *count;
            }

            Action::Send(command) => {
                if self.connection == ConnectionState::Connected {
                    self.notify(Notification::error("Waiting for the hub to accept the token"));
                } else if self.connection != ConnectionState::Authenticated {
                    self.notify(Notification::error("Not connected to the hub"));
                } else if let Err(e) = self.client.dispatch(command) {
                    warn!(error = %e, ?command, "command not sent");
                    self.notify(Notification::error(e.to_string()));
                }
            }

            Action::OpenChart(entity_id) => {
                self.chart = Some(ChartScreen::new(entity_id.clone()));
                self.fetch_history();
            }

            Action::CloseChart => {
                self.chart = None;
                self.chart_fetched = None;
                self.chart_generation.fetch_add(1, Ordering::Relaxed);
            }

            Action::RefreshChart => self.fetch_history(),

            Action::ChartLoaded(_) | Action::ChartFailed(_) => {
                if let Some(chart) = self.chart.as_mut() {
                    chart.update(action)?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Notify(notification) => self.notify(notification.clone()),

            Action::DismissNotification => self.notification = None,

            Action::StateChanged { .. } | Action::SelectGroup(_) => {
                if let Some(follow_up) = self.panel.update(action)? {
                    self.action_tx.send(follow_up)?;
                }
            }

            Action::Render | Action::Resize(..) => {}
        }
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    fn on_tick(&mut self) {
        if self
            .notification
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
        {
            self.notification = None;
        }

        if self.chart.is_some()
            && self
                .chart_fetched
                .is_some_and(|at| at.elapsed() >= REFRESH_INTERVAL)
        {
            debug!("refreshing chart");
            self.fetch_history();
        }
    }

    /// Load the open chart's series in the background.
    fn fetch_history(&mut self) {
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        let Some(history) = self.history.clone() else {
            let _ = self
                .action_tx
                .send(Action::ChartFailed("history is not available".into()));
            return;
        };

        chart.set_loading();
        let entity_id = chart.entity_id().clone();
        self.chart_fetched = Some(Instant::now());

        let generation = self.chart_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let current = Arc::clone(&self.chart_generation);
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let result = history.recent(&entity_id, DEFAULT_WINDOW).await;
            if current.load(Ordering::Relaxed) != generation {
                debug!(%entity_id, "dropping stale history response");
                return;
            }
            let action = match result {
                Ok(series) => {
                    debug!(%entity_id, points = series.points.len(), "history loaded");
                    Action::ChartLoaded(Arc::new(series))
                }
                Err(e) => {
                    warn!(%entity_id, error = %e, "history request failed");
                    Action::ChartFailed(e.to_string())
                }
            };
            let _ = tx.send(action);
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let (content, status) = if self.fullscreen {
            (area, None)
        } else {
            let [content, status] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
            (content, Some(status))
        };

        match self.chart.as_mut() {
            Some(chart) => chart.render(frame, content),
            None => self.panel.render(frame, content),
        }

        if let Some(status) = status {
            self.render_status_bar(frame, status);
        }
        if let Some((notification, _)) = &self.notification {
            render_notification(frame, content, notification);
        }
        if self.help_visible {
            render_help(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::raw(" "),
            status_indicator::connection_span(self.connection),
        ];
        if self.entity_count > 0 {
            spans.push(Span::styled(
                format!(" │ {} entities", self.entity_count),
                theme::key_hint(),
            ));
        }
        spans.push(Span::styled(" │ ? help  Tab group  q quit", theme::key_hint()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Info => (theme::TEAL, "·"),
    };

    let text_width = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = text_width
        .saturating_add(6)
        .clamp(20, 60)
        .min(area.width);
    let height = 3u16.min(area.height);
    let toast = Rect::new(
        area.right().saturating_sub(width + 1),
        area.bottom().saturating_sub(height + 1),
        width,
        height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_PANEL));
    let inner = block.inner(toast);
    frame.render_widget(Clear, toast);
    frame.render_widget(block, toast);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(notification.message.clone(), theme::label()),
        ])),
        inner,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = 52u16.min(area.width.saturating_sub(2));
    let height = 15u16.min(area.height.saturating_sub(2));
    let help = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    let block = Block::default()
        .title(" Controls ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_PANEL));
    let inner = block.inner(help);

    let row = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };
    let lines = vec![
        Line::from(""),
        row("↑/↓ j/k", "Move between controls"),
        row("←/→ h/l", "Adjust slider, step number, pick option"),
        row("Enter", "Toggle / open chart"),
        row("Tab 1-9", "Switch group"),
        row("tap / drag", "Touch any control or slider"),
        row("r", "Refresh chart"),
        row("Esc", "Close chart"),
        row("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Esc, ? or tap to close", theme::key_hint())),
    ];

    frame.render_widget(Clear, help);
    frame.render_widget(block, help);
    frame.render_widget(Paragraph::new(lines), inner);
}
