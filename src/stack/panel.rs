//! The stack admin panel.
//!
//! Owns the row list, the shared create/edit form, the delete
//! confirmation and the win history view. Operations are synchronous: anything needing the store is
//! returned as a [`StackRequest`] and run as a command, whose result comes
//! back through the panel's message queue.

use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::Theme;
use crate::app::Notifier;
use crate::commands::Command;
use crate::config::{KeyResolver, StacksAction};
use crate::service::{Service, ServiceMsg};
use crate::stack::command;
use crate::stack::error::StackError;
use crate::stack::form::FormSnapshot;
use crate::stack::message::{StackAction, StackMsg, StackRequest};
use crate::stack::modal::{ModalMode, ModalState};
use crate::stack::model::{Stack, StackId};
use crate::stack::store::StackStore;
use crate::stack::view::{
    DeleteStackDialog, StackFormModal, StackListScreen, WinHistoryScreen, dialog_keybindings,
};
use crate::ui::{
    Component, ConfirmEvent, EventResult, FormEvent, Keybinding, Modal, Screen, Spinner,
    StatusEntry,
};

const BANNER_HEIGHT: u16 = 3;

pub struct StackAdminPanel {
    store: Arc<dyn StackStore>,
    resolver: Arc<KeyResolver>,
    notifier: Notifier,

    list: StackListScreen,
    form: StackFormModal,
    modal: ModalState,
    confirm: Option<DeleteStackDialog>,
    history: Option<WinHistoryScreen>,
    banner: Option<String>,
    enabled_only: bool,
    loading: bool,
    /// Bumped on every reload; only the matching listing is applied.
    list_generation: u64,
    spinner: Spinner,

    msg_tx: UnboundedSender<StackMsg>,
    msg_rx: UnboundedReceiver<StackMsg>,
}

impl StackAdminPanel {
    pub fn new(
        store: Arc<dyn StackStore>,
        resolver: Arc<KeyResolver>,
        notifier: Notifier,
        enabled_only: bool,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            list: StackListScreen::new(resolver.clone()),
            form: StackFormModal::new(resolver.clone()),
            store,
            resolver,
            notifier,
            modal: ModalState::default(),
            confirm: None,
            history: None,
            banner: None,
            enabled_only,
            loading: false,
            list_generation: 0,
            spinner: Spinner::new(),
            msg_tx,
            msg_rx,
        }
    }

    // === Operations ===

    /// Show an empty form for a new stack.
    pub fn open_create(&mut self) {
        self.modal = ModalState::create();
        self.form.reset(self.modal.title());
    }

    /// Show the form for an existing stack, prefilled from its row.
    ///
    /// The returned fetch refreshes the form once the store answers.
    pub fn open_edit(&mut self, id: StackId) -> StackRequest {
        self.modal = ModalState::edit(id.clone());
        self.form.reset(self.modal.title());
        if let Some(stack) = self.list.find(&id) {
            self.form.fill(&FormSnapshot::from(&stack.payload()));
        }
        StackRequest::Fetch(id)
    }

    pub fn close_modal(&mut self) {
        self.modal.hide();
    }

    /// Validate the form and route it to create or update.
    ///
    /// Returns `None` when nothing should be dispatched: the modal is hidden
    /// or the form is invalid. An invalid form stays open with the error shown.
    pub fn submit(&mut self) -> Option<StackRequest> {
        let mode = self.modal.mode()?.clone();
        let payload = match self.form.snapshot().to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Rejected stack form: {e}");
                self.form.show_error(&e);
                self.notifier.error(e.to_string());
                return None;
            }
        };
        self.modal.hide();
        Some(match mode {
            ModalMode::Create => StackRequest::Create(payload),
            ModalMode::Edit(id) => StackRequest::Update(id, payload),
        })
    }

    /// Ask for confirmation before deleting.
    pub fn request_delete(&mut self, id: StackId) {
        let name = self.list.find(&id).map(|stack| stack.name.clone());
        self.confirm = Some(DeleteStackDialog::new(
            id,
            name.as_deref(),
            self.resolver.clone(),
        ));
    }

    /// Answer the pending confirmation.
    pub fn resolve_delete(&mut self, confirmed: bool) -> Option<StackRequest> {
        let dialog = self.confirm.take()?;
        debug!(
            "Delete of stack {} {}",
            dialog.target(),
            if confirmed { "confirmed" } else { "cancelled" }
        );
        confirmed.then(|| StackRequest::Delete(dialog.into_target()))
    }

    pub fn reload(&mut self) -> StackRequest {
        self.loading = true;
        self.list_generation += 1;
        StackRequest::List {
            enabled_only: self.enabled_only,
            generation: self.list_generation,
        }
    }

    pub fn toggle_enabled_filter(&mut self) -> StackRequest {
        self.enabled_only = !self.enabled_only;
        self.notifier.info(if self.enabled_only {
            "Showing enabled stacks only"
        } else {
            "Showing all stacks"
        });
        self.reload()
    }

    pub fn dismiss_banner(&mut self) {
        self.set_banner(None);
    }

    /// Show the win history of one stack, or of all stacks when `scope` is
    /// `None`. Reopening with the same scope reloads it.
    pub fn open_history(&mut self, scope: Option<StackId>) -> StackRequest {
        let reopened = self
            .history
            .as_ref()
            .is_some_and(|history| history.scope() == scope.as_ref());
        if !reopened {
            let name = scope
                .as_ref()
                .and_then(|id| self.list.find(id))
                .map(|stack| stack.name.clone());
            self.history = Some(WinHistoryScreen::new(
                scope.clone(),
                name.as_deref(),
                self.resolver.clone(),
            ));
        }
        StackRequest::History(scope)
    }

    pub fn close_history(&mut self) {
        self.history = None;
    }

    // === State ===

    pub const fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn stacks(&self) -> &[Stack] {
        self.list.stacks()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub const fn pending_delete(&self) -> Option<&DeleteStackDialog> {
        self.confirm.as_ref()
    }

    pub const fn enabled_only(&self) -> bool {
        self.enabled_only
    }

    pub const fn history(&self) -> Option<&WinHistoryScreen> {
        self.history.as_ref()
    }

    /// Build the command performing `request`.
    pub fn command(&self, request: StackRequest) -> Box<dyn Command> {
        command::for_request(request, self.store.clone(), self.msg_tx.clone())
    }

    fn dispatch(&self, request: StackRequest) -> ServiceMsg {
        debug!("Dispatching {:?}", request.action());
        ServiceMsg::Run(vec![self.command(request)])
    }

    fn queue(&self, msg: StackMsg) {
        let _ = self.msg_tx.send(msg);
    }

    fn visible_to_filter(&self, stack: &Stack) -> bool {
        !self.enabled_only || stack.enabled
    }

    fn set_banner(&mut self, banner: Option<String>) {
        self.list.set_banner_shown(banner.is_some());
        self.banner = banner;
    }

    // === Message processing ===

    fn process_message(&mut self, msg: StackMsg) -> ServiceMsg {
        match msg {
            StackMsg::Initialize | StackMsg::Reload => {
                let request = self.reload();
                self.dispatch(request)
            }
            StackMsg::ToggleEnabledFilter => {
                let request = self.toggle_enabled_filter();
                self.dispatch(request)
            }
            StackMsg::DismissBanner => {
                self.dismiss_banner();
                ServiceMsg::Idle
            }
            StackMsg::OpenCreate => {
                self.open_create();
                ServiceMsg::Idle
            }
            StackMsg::OpenEdit(id) => {
                let request = self.open_edit(id);
                self.dispatch(request)
            }
            StackMsg::CloseModal => {
                self.close_modal();
                ServiceMsg::Idle
            }
            StackMsg::Submit => self
                .submit()
                .map_or(ServiceMsg::Idle, |request| self.dispatch(request)),
            StackMsg::RequestDelete(id) => {
                self.request_delete(id);
                ServiceMsg::Idle
            }
            StackMsg::DeleteConfirmed => self
                .resolve_delete(true)
                .map_or(ServiceMsg::Idle, |request| self.dispatch(request)),
            StackMsg::DeleteCancelled => {
                self.resolve_delete(false);
                ServiceMsg::Idle
            }
            StackMsg::OpenHistory(scope) => {
                let request = self.open_history(scope);
                self.dispatch(request)
            }
            StackMsg::CloseHistory => {
                self.close_history();
                ServiceMsg::Idle
            }
            result => {
                self.apply_result(result);
                ServiceMsg::Idle
            }
        }
    }

    fn apply_result(&mut self, msg: StackMsg) {
        match msg {
            StackMsg::Loaded { generation, stacks } => {
                if generation != self.list_generation {
                    debug!("Dropping stale stack list #{generation}");
                    return;
                }
                debug!("Loaded {} stacks", stacks.len());
                self.loading = false;
                self.list.set_stacks(stacks);
            }
            // Only the form is refreshed: a fetch may finish after a newer
            // write, so rows are patched by write results alone.
            StackMsg::Fetched(stack) => {
                if self.modal.target_id() == Some(&stack.id) && !self.form.is_dirty() {
                    self.form.fill(&FormSnapshot::from(&stack.payload()));
                }
            }
            StackMsg::Created(stack) => {
                if self.visible_to_filter(&stack) {
                    self.list.prepend(stack);
                }
                self.notifier.success("Stack created successfully!");
            }
            StackMsg::Updated(stack) => {
                if self.visible_to_filter(&stack) {
                    self.list.replace(stack);
                } else {
                    self.list.remove(&stack.id);
                }
                self.notifier.success("Stack updated successfully!");
            }
            StackMsg::Deleted(id) => {
                self.list.remove(&id);
                self.notifier.success("Stack deleted successfully!");
            }
            StackMsg::HistoryLoaded { scope, entries } => match &mut self.history {
                Some(history) if history.scope() == scope.as_ref() => {
                    debug!("Loaded {} wins", entries.len());
                    history.set_entries(entries);
                }
                _ => debug!("Dropping win history for a closed view"),
            },
            StackMsg::Failed { action, error } => self.apply_failure(action, &error),
            other => warn!("Unexpected stack message: {other:?}"),
        }
    }

    fn apply_failure(&mut self, action: StackAction, error: &StackError) {
        warn!("Failed to {action}: {error}");
        match action {
            StackAction::List => self.loading = false,
            StackAction::History => {
                if let Some(history) = &mut self.history {
                    history.stop_loading();
                }
            }
            _ => {}
        }
        if let StackError::NotFound(id) = error {
            self.list.remove(id);
            if self.modal.target_id() == Some(id) {
                self.modal.hide();
            }
        }
        let message = format!("Failed to {action}: {error}");
        self.notifier.error(message.clone());
        self.set_banner(Some(message));
    }

    // === Rendering ===

    fn render_banner(&self, frame: &mut Frame, area: Rect, theme: &Theme, message: &str) {
        let dismiss = self.resolver.display_stacks(StacksAction::DismissBanner);
        let line = Line::from(vec![
            Span::styled(
                "✗ ",
                Style::default().fg(theme.red()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(message.to_string(), Style::default().fg(theme.text())),
            Span::styled(
                format!("  ({dismiss} to dismiss)"),
                Style::default().fg(theme.overlay1()),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.red()));
        frame.render_widget(
            Paragraph::new(line).wrap(Wrap { trim: true }).block(block),
            area,
        );
    }
}

impl Service for StackAdminPanel {
    fn init(&mut self) {
        self.queue(StackMsg::Initialize);
    }

    fn handle_tick(&mut self) {
        if self.loading || self.history.as_ref().is_some_and(WinHistoryScreen::is_loading) {
            self.spinner.handle_tick();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
        if let Some(dialog) = &mut self.confirm {
            match dialog.handle_key(key) {
                Ok(EventResult::Event(ConfirmEvent::Confirmed)) => {
                    self.queue(StackMsg::DeleteConfirmed);
                }
                Ok(EventResult::Event(ConfirmEvent::Cancelled)) => {
                    self.queue(StackMsg::DeleteCancelled);
                }
                Ok(_) => {}
                Err(e) => warn!("Delete dialog failed to handle key: {e}"),
            }
            return EventResult::Consumed;
        }

        if self.modal.is_visible() {
            match self.form.handle_key(key) {
                Ok(EventResult::Event(FormEvent::Submitted)) => self.queue(StackMsg::Submit),
                Ok(EventResult::Event(FormEvent::Cancelled)) => self.queue(StackMsg::CloseModal),
                Ok(_) => {}
                Err(e) => warn!("Stack form failed to handle key: {e}"),
            }
            return EventResult::Consumed;
        }

        let handled = match &mut self.history {
            Some(history) => history.handle_key(key),
            None => self.list.handle_key(key),
        };
        match handled {
            Ok(EventResult::Event(msg)) => {
                self.queue(msg);
                EventResult::Consumed
            }
            Ok(EventResult::Consumed) => EventResult::Consumed,
            Ok(EventResult::Ignored) => EventResult::Ignored,
            Err(e) => {
                warn!("Stack screen failed to handle key: {e}");
                EventResult::Ignored
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> EventResult<()> {
        if let Some(dialog) = &mut self.confirm {
            if let Ok(EventResult::Event(ConfirmEvent::Cancelled)) = dialog.handle_mouse(mouse) {
                self.queue(StackMsg::DeleteCancelled);
            }
            return EventResult::Consumed;
        }
        if self.modal.is_visible() {
            match self.form.handle_mouse(mouse) {
                Ok(EventResult::Event(FormEvent::Cancelled)) => self.queue(StackMsg::CloseModal),
                Ok(EventResult::Event(FormEvent::Submitted)) => self.queue(StackMsg::Submit),
                Ok(_) => {}
                Err(e) => warn!("Stack form failed to handle mouse: {e}"),
            }
            return EventResult::Consumed;
        }
        EventResult::Ignored
    }

    fn update(&mut self) -> color_eyre::Result<ServiceMsg> {
        let mut commands = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            match self.process_message(msg) {
                ServiceMsg::Idle => {}
                ServiceMsg::Run(cmds) => commands.extend(cmds),
                ServiceMsg::Close => return Ok(ServiceMsg::Close),
            }
        }
        if commands.is_empty() {
            Ok(ServiceMsg::Idle)
        } else {
            Ok(ServiceMsg::Run(commands))
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let list_area = if let Some(message) = &self.banner {
            let [banner, rest] =
                Layout::vertical([Constraint::Length(BANNER_HEIGHT), Constraint::Min(0)]).areas(area);
            self.render_banner(frame, banner, theme, message);
            rest
        } else {
            area
        };

        match &mut self.history {
            Some(history) if history.is_loading() && history.entries().is_empty() => {
                self.spinner.set_label("Loading win history...");
                self.spinner.render(frame, list_area, theme);
            }
            Some(history) => history.render(frame, list_area, theme),
            None if self.loading && self.list.stacks().is_empty() => {
                self.spinner.set_label("Loading stacks...");
                self.spinner.render(frame, list_area, theme);
            }
            None => self.list.render(frame, list_area, theme),
        }

        if self.modal.is_visible() {
            self.form.render(frame, area, theme);
        }
        if let Some(dialog) = &mut self.confirm {
            dialog.render(frame, area, theme);
        }
    }

    fn breadcrumbs(&self) -> Vec<String> {
        let mut crumbs = self.list.breadcrumbs();
        if let Some(history) = &self.history {
            crumbs.extend(history.breadcrumbs());
            return crumbs;
        }
        match self.modal.mode() {
            Some(ModalMode::Create) => crumbs.push("New".to_string()),
            Some(ModalMode::Edit(id)) => crumbs.push(
                self.list
                    .find(id)
                    .map_or_else(|| id.to_string(), |stack| stack.name.clone()),
            ),
            None => {}
        }
        crumbs
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        if self.pending_delete().is_some() {
            dialog_keybindings(&self.resolver)
        } else if self.modal.is_visible() {
            self.form.keybindings()
        } else if let Some(history) = &self.history {
            history.keybindings()
        } else {
            self.list.keybindings()
        }
    }

    fn status(&self) -> Vec<StatusEntry> {
        if let Some(history) = &self.history {
            return vec![
                StatusEntry::new("Wins", history.entries().len().to_string()),
                StatusEntry::new("Paid out", format!("{} sats", history.total_won())),
            ];
        }
        let stacks = self.list.stacks();
        let enabled = stacks.iter().filter(|stack| stack.enabled).count();
        vec![
            StatusEntry::new("Stacks", format!("{} ({} shown)", stacks.len(), self.list.visible_len())),
            StatusEntry::new("Enabled", enabled.to_string()),
            StatusEntry::new(
                "Filter",
                if self.enabled_only() { "enabled only" } else { "all" },
            ),
        ]
    }

    fn has_modal(&self) -> bool {
        self.modal.is_visible() || self.confirm.is_some()
    }
}
