//! Terminal input reader.
//!
//! A background task turns crossterm's event stream into [`Event`]s and
//! interleaves them with the tick and render clocks. Mouse input is
//! reduced to what a touchscreen produces: press, drag and wheel.

use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Pointer gesture at a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touch {
    pub kind: TouchKind,
    pub column: u16,
    pub row: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Press,
    Drag,
    ScrollUp,
    ScrollDown,
}

impl Touch {
    /// Reduce a crossterm mouse event; releases and moves are dropped.
    pub fn from_mouse(mouse: MouseEvent) -> Option<Self> {
        let kind = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => TouchKind::Press,
            MouseEventKind::Drag(MouseButton::Left) => TouchKind::Drag,
            MouseEventKind::ScrollUp => TouchKind::ScrollUp,
            MouseEventKind::ScrollDown => TouchKind::ScrollDown,
            _ => return None,
        };
        Some(Self {
            kind,
            column: mouse.column,
            row: mouse.row,
        })
    }
}

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Touch(Touch),
    Resize(u16, u16),
    /// Housekeeping clock: toast expiry, chart refresh.
    Tick,
    Render,
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_events(tx, cancel.clone(), tick_rate, render_rate));
        Self { rx, cancel }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_events(
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
    render_rate: Duration,
) {
    let mut stream = EventStream::new();
    let mut tick = tokio::time::interval(tick_rate);
    let mut render = tokio::time::interval(render_rate);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            _ = tick.tick() => Event::Tick,
            _ = render.tick() => Event::Render,
            Some(Ok(raw)) = stream.next() => match raw {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                CrosstermEvent::Mouse(mouse) => match Touch::from_mouse(mouse) {
                    Some(touch) => Event::Touch(touch),
                    None => continue,
                },
                CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                _ => continue,
            },
        };

        if tx.send(event).is_err() {
            break;
        }
    }
}
