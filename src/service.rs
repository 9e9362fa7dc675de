use color_eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;
use crate::commands::Command;
use crate::ui::{EventResult, Keybinding, StatusEntry};

pub enum ServiceMsg {
    /// No action needed
    Idle,
    /// Run one or more commands
    Run(Vec<Box<dyn Command>>),
    /// Close the service and quit
    Close,
}

impl<T: Command> From<T> for ServiceMsg {
    fn from(value: T) -> Self {
        Self::Run(vec![Box::new(value)])
    }
}

/// A screen hosted by the App.
///
/// Services manage their own internal state and message queue. The App calls
/// methods in this order:
///
/// 1. `init()` - once at startup
/// 2. `update()` - immediately after init to process startup messages
/// 3. For each event:
///    - `handle_tick()` if tick event
///    - `handle_key()` or `handle_mouse()` if input event
///    - `update()` to drain queued messages, including command results
pub trait Service {
    /// Initialize the service by queuing startup message(s).
    fn init(&mut self) {}

    /// Handle a tick event for animations.
    fn handle_tick(&mut self) {}

    /// Handle a key event.
    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()>;

    /// Handle a mouse event.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> EventResult<()> {
        _ = mouse;
        EventResult::Ignored
    }

    /// Process all queued messages and return the result.
    ///
    /// # Errors
    /// Returns an error if message processing fails.
    /// In this case, the App will display the error and the service might be in an invalid state.
    fn update(&mut self) -> Result<ServiceMsg>;

    /// Render the service to the frame.
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Breadcrumb segments for the navigation bar.
    fn breadcrumbs(&self) -> Vec<String>;

    /// Returns the keybindings for the current view in this service.
    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }

    /// Status entries shown next to the breadcrumbs.
    fn status(&self) -> Vec<StatusEntry> {
        vec![]
    }

    /// Whether a modal currently captures input.
    fn has_modal(&self) -> bool {
        false
    }
}
