//! Terminal UI wrapper.
//!
//! [`Tui`] wraps ratatui's Terminal: raw mode, the alternate screen, mouse
//! capture and an async event stream with tick and frame intervals.

use std::io::Stdout;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crossterm::cursor;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, EventStream, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use futures::{FutureExt, StreamExt};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

const GRACEFUL_SHUTDOWN_TIMEOUT_MS: u64 = 500;
const FORCEFUL_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

pub type Backend = CrosstermBackend<Stdout>;

#[derive(Clone, Debug)]
pub enum Event {
    Quit,
    Suspend,
    Error(String),
    Tick,
    Render,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
}

/// Terminal UI wrapper.
pub struct Tui {
    terminal: Terminal<Backend>,
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
    event_rx: UnboundedReceiver<Event>,
    event_tx: UnboundedSender<Event>,
    frame_rate: f64,
    tick_rate: f64,
}

impl Tui {
    /// Create a new TUI with the specified frame and tick rates, per second.
    pub fn new(frame_rate: f64, tick_rate: f64) -> color_eyre::Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal: Terminal::new(Backend::new(std::io::stdout()))?,
            task: tokio::spawn(async {}),
            cancellation_token: CancellationToken::new(),
            event_rx,
            event_tx,
            frame_rate,
            tick_rate,
        })
    }

    /// Enter raw mode and the alternate screen, and start the event loop.
    pub fn enter(&mut self) -> color_eyre::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        self.start();
        Ok(())
    }

    /// Restore the terminal.
    pub fn exit(&mut self) -> color_eyre::Result<()> {
        self.stop()?;
        if crossterm::terminal::is_raw_mode_enabled()? {
            self.flush()?;
            crossterm::execute!(
                std::io::stdout(),
                DisableMouseCapture,
                LeaveAlternateScreen,
                cursor::Show
            )?;
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    /// Hand the terminal back to the shell (Ctrl+Z).
    pub fn suspend(&mut self) -> color_eyre::Result<()> {
        self.exit()?;
        #[cfg(not(windows))]
        signal_hook::low_level::raise(signal_hook::consts::SIGTSTP)?;
        Ok(())
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    fn start(&mut self) {
        self.cancellation_token.cancel();
        self.cancellation_token = CancellationToken::new();
        let event_loop = Self::event_loop(
            self.event_tx.clone(),
            self.cancellation_token.clone(),
            self.tick_rate,
            self.frame_rate,
        );
        self.task = tokio::spawn(event_loop);
    }

    fn stop(&self) -> color_eyre::Result<()> {
        self.cancellation_token.cancel();
        let mut shutdown_counter = 0;
        while !self.task.is_finished() {
            std::thread::sleep(Duration::from_millis(1));
            shutdown_counter += 1;
            if shutdown_counter >= GRACEFUL_SHUTDOWN_TIMEOUT_MS {
                self.task.abort();
            }
            if shutdown_counter >= FORCEFUL_SHUTDOWN_TIMEOUT_MS {
                return Err(color_eyre::eyre::eyre!("Failed to stop TUI task"));
            }
        }
        Ok(())
    }

    fn map_key(key: KeyEvent) -> Option<Event> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        Some(match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Event::Quit,
            (KeyCode::Char('z'), KeyModifiers::CONTROL) => Event::Suspend,
            _ => Event::Key(key),
        })
    }

    async fn event_loop(
        event_tx: UnboundedSender<Event>,
        cancellation_token: CancellationToken,
        tick_rate: f64,
        frame_rate: f64,
    ) {
        let mut event_stream = EventStream::new();
        let mut tick_interval = interval(Duration::from_secs_f64(1.0 / tick_rate));
        let mut frame_interval = interval(Duration::from_secs_f64(1.0 / frame_rate));

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    let event_tx = event_tx.clone();
                    tokio::spawn(async move {
                        sigterm.recv().await;
                        let _ = event_tx.send(Event::Quit);
                    });
                }
                Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
            }
        }

        loop {
            let event = tokio::select! {
                () = cancellation_token.cancelled() => break,
                _ = tick_interval.tick() => Event::Tick,
                _ = frame_interval.tick() => Event::Render,
                crossterm_event = event_stream.next().fuse() => match crossterm_event {
                    Some(Ok(CrosstermEvent::Key(key))) => match Self::map_key(key) {
                        Some(event) => event,
                        None => continue,
                    },
                    Some(Ok(CrosstermEvent::Mouse(mouse))) => Event::Mouse(mouse),
                    Some(Ok(CrosstermEvent::Resize(width, height))) => Event::Resize(width, height),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => Event::Error(e.to_string()),
                    None => break,
                },
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
        cancellation_token.cancel();
    }
}

impl Deref for Tui {
    type Target = Terminal<Backend>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            error!("Failed to restore terminal: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_keys_map_to_app_events() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert!(matches!(Tui::map_key(ctrl('c')), Some(Event::Quit)));
        assert!(matches!(Tui::map_key(ctrl('z')), Some(Event::Suspend)));
        assert!(matches!(
            Tui::map_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Event::Key(_))
        ));

        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(Tui::map_key(release).is_none());
    }
}
