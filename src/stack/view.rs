//! Stack screens and modals.
//!
//! These translate generic component events into [`StackMsg`]s and never
//! touch the store.

use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;
use crate::config::{
    DialogAction, FormAction, GlobalAction, KeyResolver, NavAction, SearchAction, StacksAction,
};
use crate::stack::error::{StackField, ValidationError};
use crate::stack::form::FormSnapshot;
use crate::stack::message::StackMsg;
use crate::stack::model::{Stack, StackId, WinHistory};
use crate::ui::{
    Component, ConfirmDialog, ConfirmEvent, EventResult, Form, FormEvent, FormField, Keybinding,
    Modal, Result, Screen, Table, TableEvent,
};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this stack?";

/// The stack list, newest first.
pub struct StackListScreen {
    table: Table<Stack>,
    banner_shown: bool,
    resolver: Arc<KeyResolver>,
}

impl StackListScreen {
    pub fn new(resolver: Arc<KeyResolver>) -> Self {
        Self {
            table: Table::new(Vec::new(), resolver.clone())
                .with_title("Stacks")
                .with_empty_message("No stacks yet. Press n to create one."),
            banner_shown: false,
            resolver,
        }
    }

    pub fn stacks(&self) -> &[Stack] {
        self.table.items()
    }

    pub fn find(&self, id: &StackId) -> Option<&Stack> {
        self.stacks().iter().find(|stack| &stack.id == id)
    }

    pub fn set_stacks(&mut self, stacks: Vec<Stack>) {
        self.table.set_items(stacks);
    }

    pub const fn visible_len(&self) -> usize {
        self.table.visible_len()
    }

    /// Whether an error banner sits above the list, so dismissing it is offered.
    pub const fn set_banner_shown(&mut self, shown: bool) {
        self.banner_shown = shown;
    }

    /// Insert a new row at the top.
    pub fn prepend(&mut self, stack: Stack) {
        self.patch(|rows| rows.insert(0, stack));
    }

    /// Replace a row in place. Returns false when the row is not listed.
    pub fn replace(&mut self, stack: Stack) -> bool {
        let Some(index) = self.stacks().iter().position(|s| s.id == stack.id) else {
            return false;
        };
        self.patch(|rows| rows[index] = stack);
        true
    }

    pub fn remove(&mut self, id: &StackId) {
        if self.find(id).is_some() {
            self.patch(|rows| rows.retain(|stack| &stack.id != id));
        }
    }

    fn patch(&mut self, f: impl FnOnce(&mut Vec<Stack>)) {
        let mut rows = self.table.items().to_vec();
        f(&mut rows);
        self.table.set_items(rows);
    }

    fn selected_id(&self) -> Option<StackId> {
        self.table.selected_item().map(|stack| stack.id.clone())
    }
}

impl Screen for StackListScreen {
    type Output = StackMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        // Typed characters belong to the search box
        if !self.table.is_searching() {
            let r = &self.resolver;
            if r.matches_stacks(&key, StacksAction::New) {
                return Ok(StackMsg::OpenCreate.into());
            }
            if r.matches_stacks(&key, StacksAction::Edit) {
                return Ok(self.selected_id().map_or(EventResult::Consumed, |id| {
                    StackMsg::OpenEdit(id).into()
                }));
            }
            if r.matches_stacks(&key, StacksAction::Delete) {
                return Ok(self.selected_id().map_or(EventResult::Consumed, |id| {
                    StackMsg::RequestDelete(id).into()
                }));
            }
            if r.matches_stacks(&key, StacksAction::Reload) {
                return Ok(StackMsg::Reload.into());
            }
            if r.matches_stacks(&key, StacksAction::ToggleFilter) {
                return Ok(StackMsg::ToggleEnabledFilter.into());
            }
            if r.matches_stacks(&key, StacksAction::DismissBanner) {
                return Ok(StackMsg::DismissBanner.into());
            }
            if r.matches_stacks(&key, StacksAction::History) {
                return Ok(self.selected_id().map_or(EventResult::Consumed, |id| {
                    StackMsg::OpenHistory(Some(id)).into()
                }));
            }
            if r.matches_stacks(&key, StacksAction::AllHistory) {
                return Ok(StackMsg::OpenHistory(None).into());
            }
        }

        match self.table.handle_key(key)? {
            EventResult::Event(TableEvent::Activated(stack)) => Ok(StackMsg::OpenEdit(stack.id).into()),
            EventResult::Event(_) | EventResult::Consumed => Ok(EventResult::Consumed),
            EventResult::Ignored => Ok(EventResult::Ignored),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.table.render(frame, area, theme);
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec!["Stacks".to_string()]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        let mut bindings = vec![
            Keybinding::hint(r.display_stacks(StacksAction::New), "New"),
            Keybinding::hint(r.display_stacks(StacksAction::Edit), "Edit"),
            Keybinding::hint(r.display_stacks(StacksAction::Delete), "Delete"),
            Keybinding::new(r.display_nav(NavAction::Select), "Edit selected"),
            Keybinding::hint(r.display_stacks(StacksAction::History), "Win history"),
            Keybinding::new(r.display_stacks(StacksAction::AllHistory), "All win history"),
            Keybinding::new(r.display_stacks(StacksAction::Reload), "Reload"),
            Keybinding::hint(r.display_stacks(StacksAction::ToggleFilter), "Enabled only"),
            Keybinding::new(r.display_search(SearchAction::Toggle), "Search"),
        ];
        if self.banner_shown {
            bindings.push(Keybinding::hint(
                r.display_stacks(StacksAction::DismissBanner),
                "Dismiss error",
            ));
        }
        bindings
    }
}

/// Payouts of one stack, or of all stacks.
pub struct WinHistoryScreen {
    table: Table<WinHistory>,
    scope: Option<StackId>,
    label: String,
    loading: bool,
    resolver: Arc<KeyResolver>,
}

impl WinHistoryScreen {
    /// `name` labels a single-stack history; without a scope the screen
    /// covers every stack.
    pub fn new(scope: Option<StackId>, name: Option<&str>, resolver: Arc<KeyResolver>) -> Self {
        let label = match (&scope, name) {
            (Some(_), Some(name)) => name.to_string(),
            (Some(id), None) => format!("Stack {id}"),
            (None, _) => "All stacks".to_string(),
        };
        Self {
            table: Table::new(Vec::new(), resolver.clone())
                .with_title(format!("Win history: {label}"))
                .with_empty_message("No wins recorded yet."),
            scope,
            label,
            loading: true,
            resolver,
        }
    }

    pub const fn scope(&self) -> Option<&StackId> {
        self.scope.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn entries(&self) -> &[WinHistory] {
        self.table.items()
    }

    pub fn set_entries(&mut self, entries: Vec<WinHistory>) {
        self.loading = false;
        self.table.set_items(entries);
    }

    pub const fn stop_loading(&mut self) {
        self.loading = false;
    }

    /// Sum of all payouts shown.
    pub fn total_won(&self) -> i64 {
        self.entries().iter().map(|win| win.amount_won).sum()
    }
}

impl Screen for WinHistoryScreen {
    type Output = StackMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if !self.table.is_searching() {
            let r = &self.resolver;
            if r.matches_global(&key, GlobalAction::Back) {
                return Ok(StackMsg::CloseHistory.into());
            }
            if r.matches_stacks(&key, StacksAction::Reload) {
                self.loading = true;
                return Ok(StackMsg::OpenHistory(self.scope.clone()).into());
            }
        }

        match self.table.handle_key(key)? {
            EventResult::Event(_) | EventResult::Consumed => Ok(EventResult::Consumed),
            EventResult::Ignored => Ok(EventResult::Ignored),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.table.render(frame, area, theme);
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec![self.label.clone(), "Win history".to_string()]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_global(GlobalAction::Back), "Back to stacks"),
            Keybinding::hint(r.display_stacks(StacksAction::Reload), "Reload"),
            Keybinding::new(r.display_search(SearchAction::Toggle), "Search"),
        ]
    }
}

/// Shared create/edit form for a stack.
pub struct StackFormModal {
    form: Form,
    resolver: Arc<KeyResolver>,
}

impl StackFormModal {
    pub fn new(resolver: Arc<KeyResolver>) -> Self {
        let fields = StackField::ALL
            .iter()
            .map(|&field| match field {
                StackField::Name => FormField::text(field.key(), field.label(), "Gold Stack"),
                StackField::Description => {
                    FormField::text(field.key(), field.label(), "optional")
                }
                StackField::BetPrice => FormField::number(field.key(), field.label(), "1000"),
                StackField::WinningProbability => {
                    FormField::number(field.key(), field.label(), "0.45")
                }
                StackField::FeePercentage => FormField::number(field.key(), field.label(), "2.5"),
                StackField::Enabled => FormField::checkbox(field.key(), field.label(), true),
            })
            .collect();
        Self {
            form: Form::new(fields, resolver.clone()),
            resolver,
        }
    }

    /// Clear every field and retitle the form.
    pub fn reset(&mut self, title: &str) {
        self.form.reset();
        self.form.set_title(title);
    }

    /// Load values into the form without marking it as edited.
    pub fn fill(&mut self, snapshot: &FormSnapshot) {
        for field in StackField::ALL {
            if field == StackField::Enabled {
                self.form.set_checked(field.key(), snapshot.enabled);
            } else {
                self.form.set_value(field.key(), snapshot.value(field));
            }
        }
        self.form.mark_clean();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let value = |field: StackField| self.form.value(field.key()).to_string();
        FormSnapshot {
            name: value(StackField::Name),
            description: value(StackField::Description),
            bet_price: value(StackField::BetPrice),
            winning_probability: value(StackField::WinningProbability),
            fee_percentage: value(StackField::FeePercentage),
            enabled: self.form.checked(StackField::Enabled.key()),
        }
    }

    /// Show a validation error inline and move focus to the offending field.
    pub fn show_error(&mut self, error: &ValidationError) {
        self.form.set_error(Some(error.to_string()));
        self.form.focus_field(error.field().key());
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.form.error()
    }

    pub const fn is_dirty(&self) -> bool {
        self.form.is_dirty()
    }

    pub fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_form(FormAction::Submit), "Save"),
            Keybinding::hint(r.display_form(FormAction::Cancel), "Cancel"),
            Keybinding::new(r.display_form(FormAction::NextField), "Next field"),
            Keybinding::new(r.display_form(FormAction::PrevField), "Previous field"),
            Keybinding::new(r.display_form(FormAction::Toggle), "Toggle checkbox"),
        ]
    }

    #[cfg(test)]
    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

impl Modal for StackFormModal {
    type Output = FormEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        self.form.handle_key(key)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        self.form.handle_mouse(mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.form.render(frame, area, theme);
    }

    fn title(&self) -> Option<&str> {
        Some(self.form.title())
    }
}

/// Confirmation before deleting a stack.
pub struct DeleteStackDialog {
    dialog: ConfirmDialog,
    target: StackId,
}

impl DeleteStackDialog {
    pub fn new(target: StackId, name: Option<&str>, resolver: Arc<KeyResolver>) -> Self {
        let title = name.map_or_else(|| "Delete Stack".to_string(), |name| format!("Delete '{name}'"));
        Self {
            dialog: ConfirmDialog::new(DELETE_PROMPT, resolver)
                .with_title(title)
                .with_confirm_text("Delete")
                .danger(),
            target,
        }
    }

    pub const fn target(&self) -> &StackId {
        &self.target
    }

    pub fn into_target(self) -> StackId {
        self.target
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        self.dialog.message()
    }
}

impl Modal for DeleteStackDialog {
    type Output = ConfirmEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        self.dialog.handle_key(key)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        self.dialog.handle_mouse(mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.dialog.render(frame, area, theme);
    }

    fn title(&self) -> Option<&str> {
        Some(self.dialog.title())
    }
}

/// Key hints for the delete dialog.
pub fn dialog_keybindings(resolver: &KeyResolver) -> Vec<Keybinding> {
    vec![
        Keybinding::hint(resolver.display_dialog(DialogAction::Confirm), "Delete"),
        Keybinding::hint(resolver.display_dialog(DialogAction::Cancel), "Keep"),
    ]
}
