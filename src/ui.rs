pub mod components;
pub mod widgets;

mod help;
mod status_bar;
mod toast;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;

pub use color_eyre::Result;

use crate::Theme;

pub use components::{
    ColumnDef, ConfirmDialog, ConfirmEvent, Form, FormEvent, FormField, Table, TableEvent,
    TableRow,
};
pub use help::{HelpEvent, HelpOverlay, KeybindingSection};
pub use status_bar::{StatusBar, StatusEntry};
pub use toast::{Toast, ToastManager, ToastType};
pub use widgets::Spinner;

/// Result of handling an input event.
///
/// - `Ignored` - The handler didn't recognize or handle this input
/// - `Consumed` - The input was handled but produced no output
/// - `Event(E)` - The input was handled and produced an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult<E> {
    /// Input was not handled, parent should process it.
    Ignored,
    /// Input was consumed but produced no event.
    Consumed,
    /// Input was consumed and produced an event.
    Event(E),
}

impl<E> EventResult<E> {
    /// Returns true if the input was consumed (either with or without an event).
    pub const fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

impl<E> From<E> for EventResult<E> {
    fn from(event: E) -> Self {
        Self::Event(event)
    }
}

/// Interactive UI building block.
///
/// Components handle input and emit generic outputs. They know nothing
/// about stacks.
pub trait Component {
    /// The output type produced by this component.
    type Output;

    /// Handle a key event.
    ///
    /// Returns `Err(...)` if an error occurred during handling.
    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        _ = key;
        Ok(EventResult::Ignored)
    }

    /// Handle a mouse event. Coordinates are absolute terminal cells.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        _ = mouse;
        Ok(EventResult::Ignored)
    }

    /// Called on each tick for animations and time-based updates.
    fn handle_tick(&mut self) {}

    /// Render the component to the frame.
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
}

/// Ephemeral overlay that blocks the screen below.
///
/// Modals capture all input until dismissed.
///
/// # Examples
///
/// - `StackFormModal` - create/edit form for a stack
/// - `DeleteStackDialog` - confirmation dialog for deletion
pub trait Modal {
    /// The message type produced by this modal.
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>>;

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        _ = mouse;
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Title shown in the modal header (optional).
    fn title(&self) -> Option<&str> {
        None
    }
}

/// Full-page view that orchestrates components.
///
/// Screens translate component events into domain messages.
pub trait Screen {
    /// The message type produced by this screen.
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>>;

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Breadcrumb segments for navigation context.
    fn breadcrumbs(&self) -> Vec<String> {
        vec![]
    }

    /// Returns the keybindings for this screen.
    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }
}

/// A key and what it does, for the status bar and the help overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinding {
    pub key: String,
    pub description: String,
    /// Whether this keybinding should be shown in the status bar hints.
    pub hint: bool,
}

impl Keybinding {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            hint: false,
        }
    }

    /// Create a keybinding that is also shown as a hint in the status bar.
    pub fn hint(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            hint: true,
        }
    }
}

/// Whether a terminal cell lies inside `area`.
pub const fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_result_consumed() {
        assert!(!EventResult::<()>::Ignored.is_consumed());
        assert!(EventResult::<()>::Consumed.is_consumed());
        assert!(EventResult::from(1).is_consumed());
    }

    #[test]
    fn test_contains() {
        let area = Rect::new(10, 5, 4, 2);
        assert!(contains(area, 10, 5));
        assert!(contains(area, 13, 6));
        assert!(!contains(area, 14, 6));
        assert!(!contains(area, 9, 5));
        assert!(!contains(area, 10, 7));
    }
}
