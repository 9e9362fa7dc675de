use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::Theme;
use crate::commands::Command;
use crate::config::{GlobalAction, KeyResolver};
use crate::service::{Service, ServiceMsg};
use crate::tui::{Event, Tui};
use crate::ui::{
    Component, EventResult, HelpEvent, HelpOverlay, KeybindingSection, StatusBar, Toast,
    ToastManager, ToastType,
};

const FRAME_RATE: f64 = 60.0;
const TICK_RATE: f64 = 4.0;
const STATUS_BAR_HEIGHT: u16 = 7;

/// Messages sent to the App from services and spawned commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    ShowToast {
        message: String,
        toast_type: ToastType,
    },
    CommandFailed {
        name: String,
        error: String,
    },
}

/// Handle services use to raise toasts.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<AppMessage>,
}

impl Notifier {
    pub const fn new(tx: UnboundedSender<AppMessage>) -> Self {
        Self { tx }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, ToastType::Success);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(message, ToastType::Info);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, ToastType::Error);
    }

    fn show(&self, message: impl Into<String>, toast_type: ToastType) {
        let _ = self.tx.send(AppMessage::ShowToast {
            message: message.into(),
            toast_type,
        });
    }
}

pub struct App {
    resolver: Arc<KeyResolver>,
    theme: Theme,
    status_bar: StatusBar,
    toasts: ToastManager,
    help: Option<HelpOverlay>,
    should_quit: bool,
    should_suspend: bool,
    app_tx: UnboundedSender<AppMessage>,
    app_rx: UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(resolver: Arc<KeyResolver>, theme: Theme) -> Self {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        Self {
            status_bar: StatusBar::new(resolver.clone()),
            resolver,
            theme,
            toasts: ToastManager::new(),
            help: None,
            should_quit: false,
            should_suspend: false,
            app_tx,
            app_rx,
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.app_tx.clone())
    }

    pub async fn run(&mut self, mut service: Box<dyn Service>) -> Result<()> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;

        service.init();
        self.process_update(service.as_mut());

        while let Some(event) = tui.next_event().await {
            match event {
                Event::Quit => self.should_quit = true,
                Event::Suspend => self.should_suspend = true,
                Event::Tick => {
                    service.handle_tick();
                    self.toasts.handle_tick();
                }
                Event::Render => self.render(&mut tui, service.as_mut())?,
                Event::Resize(width, height) => {
                    tui.resize(Rect::new(0, 0, width, height))?;
                    self.render(&mut tui, service.as_mut())?;
                }
                Event::Key(key) => self.handle_key(key, service.as_mut()),
                Event::Mouse(mouse) => self.handle_mouse(mouse, service.as_mut()),
                Event::Error(e) => warn!("Terminal event error: {e}"),
            }

            // Command results arrive asynchronously, so drain on every event
            self.process_update(service.as_mut());
            self.process_app_messages();

            if self.should_suspend {
                tui.suspend()?;
                tui.enter()?;
                tui.clear()?;
                self.should_suspend = false;
            } else if self.should_quit {
                break;
            }
        }

        info!("Shutting down");
        tui.exit()
    }

    fn handle_key(&mut self, key: KeyEvent, service: &mut dyn Service) {
        if let Some(help) = &mut self.help {
            match help.handle_key(key) {
                Ok(EventResult::Event(HelpEvent::Close)) => self.help = None,
                Ok(_) => {}
                Err(e) => error!("Help overlay failed to handle key: {e}"),
            }
            return;
        }

        if service.handle_key(key).is_consumed() {
            return;
        }

        // Typing into a modal must never quit the app
        if service.has_modal() {
            return;
        }
        if self.resolver.matches_global(&key, GlobalAction::Quit) {
            self.should_quit = true;
        } else if self.resolver.matches_global(&key, GlobalAction::Help) {
            self.help = Some(self.help_overlay(service));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, service: &mut dyn Service) {
        if let Some(help) = &mut self.help {
            if let Ok(EventResult::Event(HelpEvent::Close)) = help.handle_mouse(mouse) {
                self.help = None;
            }
            return;
        }
        service.handle_mouse(mouse);
    }

    fn help_overlay(&self, service: &dyn Service) -> HelpOverlay {
        let title = service
            .breadcrumbs()
            .last()
            .cloned()
            .unwrap_or_else(|| "Screen".to_string());
        HelpOverlay::new(
            vec![
                KeybindingSection::new(title, service.keybindings()),
                KeybindingSection::new("Global", self.status_bar.global_keybindings()),
            ],
            self.resolver.clone(),
        )
    }

    fn process_update(&mut self, service: &mut dyn Service) {
        match service.update() {
            Ok(ServiceMsg::Idle) => {}
            Ok(ServiceMsg::Run(commands)) => commands.into_iter().for_each(|c| self.spawn(c)),
            Ok(ServiceMsg::Close) => self.should_quit = true,
            Err(e) => {
                error!("Service update failed: {e:?}");
                self.toasts
                    .show(Toast::new(format!("Error: {e}"), ToastType::Error));
            }
        }
    }

    fn spawn(&self, command: Box<dyn Command>) {
        let name = command.name();
        let tx = self.app_tx.clone();
        debug!("Spawning command: {name}");
        tokio::spawn(async move {
            if let Err(e) = command.execute().await {
                error!("Command '{name}' failed: {e:?}");
                let _ = tx.send(AppMessage::CommandFailed {
                    name,
                    error: e.to_string(),
                });
            }
        });
    }

    fn process_app_messages(&mut self) {
        while let Ok(message) = self.app_rx.try_recv() {
            let toast = match message {
                AppMessage::ShowToast {
                    message,
                    toast_type,
                } => Toast::new(message, toast_type),
                AppMessage::CommandFailed { name, error } => {
                    Toast::new(format!("{name} failed: {error}"), ToastType::Error)
                }
            };
            self.toasts.show(toast);
        }
    }

    fn render(&mut self, tui: &mut Tui, service: &mut dyn Service) -> Result<()> {
        tui.draw(|frame| self.draw(frame, service))?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame, service: &mut dyn Service) {
        let area = frame.area();
        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_BAR_HEIGHT)])
                .areas(area);

        service.render(frame, main, &self.theme);
        self.status_bar.render(
            frame,
            status,
            &self.theme,
            &service.breadcrumbs(),
            &service.status(),
            &service.keybindings(),
        );
        self.toasts.render(frame, area, &self.theme);

        if let Some(help) = &mut self.help {
            help.render(frame, area, &self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keybindings::KeybindingsConfig;
    use crate::ui::Keybinding;
    use crossterm::event::{KeyCode, KeyModifiers};

    struct FakeService {
        modal: bool,
        keys: Vec<KeyEvent>,
    }

    impl Service for FakeService {
        fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
            self.keys.push(key);
            if self.modal {
                EventResult::Consumed
            } else {
                EventResult::Ignored
            }
        }

        fn update(&mut self) -> Result<ServiceMsg> {
            Ok(ServiceMsg::Idle)
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect, _theme: &Theme) {}

        fn breadcrumbs(&self) -> Vec<String> {
            vec!["Stacks".to_string()]
        }

        fn keybindings(&self) -> Vec<Keybinding> {
            vec![Keybinding::hint("n", "New")]
        }

        fn has_modal(&self) -> bool {
            self.modal
        }
    }

    fn app() -> App {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        App::new(resolver, Theme::default())
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_key_ignored_while_modal_open() {
        let mut app = app();
        let mut service = FakeService {
            modal: true,
            keys: vec![],
        };
        app.handle_key(key('q'), &mut service);
        assert!(!app.should_quit);
        assert_eq!(service.keys.len(), 1);

        service.modal = false;
        app.handle_key(key('q'), &mut service);
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_overlay_captures_keys() {
        let mut app = app();
        let mut service = FakeService {
            modal: false,
            keys: vec![],
        };
        app.handle_key(key('?'), &mut service);
        assert!(app.help.is_some());

        app.handle_key(key('q'), &mut service);
        assert!(!app.should_quit);
        assert_eq!(service.keys.len(), 1);

        app.handle_key(key('?'), &mut service);
        assert!(app.help.is_none());
    }

    #[test]
    fn test_notifier_messages_become_toasts() {
        let mut app = app();
        let notifier = app.notifier();
        notifier.success("Stack created successfully!");
        notifier.error("boom");
        app.app_tx
            .send(AppMessage::CommandFailed {
                name: "Loading stacks".to_string(),
                error: "timeout".to_string(),
            })
            .unwrap();

        app.process_app_messages();

        let toasts: Vec<_> = app
            .toasts
            .toasts()
            .map(|t| (t.message().to_string(), t.toast_type()))
            .collect();
        assert_eq!(
            toasts,
            vec![
                ("Stack created successfully!".to_string(), ToastType::Success),
                ("boom".to_string(), ToastType::Error),
                ("Loading stacks failed: timeout".to_string(), ToastType::Error),
            ]
        );
    }
}
