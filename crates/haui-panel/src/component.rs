//! Component trait shared by the panel and chart screens.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::action::Action;
use crate::event::Touch;

/// A screen or overlay.
///
/// `render` takes `&mut self` so a component can remember where it drew
/// each control; touches are hit-tested against those areas.
pub trait Component {
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn handle_touch(&mut self, _touch: Touch) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect);
}
