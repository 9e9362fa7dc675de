use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{FormAction, KeyResolver};
use crate::ui::components::TextInput;
use crate::ui::{Component, EventResult, Result, contains};

const CLOSE_ICON: &str = "[x]";
const LABEL_WIDTH: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone)]
enum FieldKind {
    Input(TextInput),
    Checkbox { checked: bool, default: bool },
}

/// A named form field.
#[derive(Debug, Clone)]
pub struct FormField {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
}

impl FormField {
    pub fn text(name: &'static str, label: &'static str, placeholder: &str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Input(TextInput::new().with_placeholder(placeholder)),
        }
    }

    pub fn number(name: &'static str, label: &'static str, placeholder: &str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Input(TextInput::new().with_placeholder(placeholder).numeric()),
        }
    }

    pub const fn checkbox(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Checkbox {
                checked: default,
                default,
            },
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn reset(&mut self) {
        match &mut self.kind {
            FieldKind::Input(input) => input.clear(),
            FieldKind::Checkbox { checked, default } => *checked = *default,
        }
    }
}

/// Modal form with keyboard focus cycling and mouse dismissal.
///
/// The form only edits values; what a submission means is up to the owner.
pub struct Form {
    title: String,
    fields: Vec<FormField>,
    focus: usize,
    error: Option<String>,
    dirty: bool,
    popup_area: Rect,
    close_area: Rect,
    field_areas: Vec<Rect>,
    resolver: Arc<KeyResolver>,
}

impl Form {
    pub fn new(fields: Vec<FormField>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            title: String::new(),
            fields,
            focus: 0,
            error: None,
            dirty: false,
            popup_area: Rect::default(),
            close_area: Rect::default(),
            field_areas: Vec::new(),
            resolver,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Clear every field, the error and the dirty flag, and focus the first field.
    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(FormField::reset);
        self.focus = 0;
        self.error = None;
        self.dirty = false;
    }

    fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Text value of a field. Checkboxes and unknown names read as empty.
    pub fn value(&self, name: &str) -> &str {
        match self.field(name).map(|f| &f.kind) {
            Some(FieldKind::Input(input)) => input.value(),
            _ => "",
        }
    }

    pub fn checked(&self, name: &str) -> bool {
        matches!(
            self.field(name).map(|f| &f.kind),
            Some(FieldKind::Checkbox { checked: true, .. })
        )
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        if let Some(FormField {
            kind: FieldKind::Input(input),
            ..
        }) = self.field_mut(name)
        {
            input.set_value(value);
        }
    }

    pub fn set_checked(&mut self, name: &str, value: bool) {
        if let Some(FormField {
            kind: FieldKind::Checkbox { checked, .. },
            ..
        }) = self.field_mut(name)
        {
            *checked = value;
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the user has edited any field since the last reset or fill.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget user edits, after the owner filled the fields programmatically.
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn focused(&self) -> Option<&'static str> {
        self.fields.get(self.focus).map(FormField::name)
    }

    pub fn focus_field(&mut self, name: &str) {
        if let Some(index) = self.fields.iter().position(|f| f.name == name) {
            self.focus = index;
        }
    }

    fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    fn focus_previous(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    fn toggle_focused(&mut self) -> bool {
        if let Some(FormField {
            kind: FieldKind::Checkbox { checked, .. },
            ..
        }) = self.fields.get_mut(self.focus)
        {
            *checked = !*checked;
            self.dirty = true;
            return true;
        }
        false
    }

    /// Compute the popup, close icon and field rects for a frame area.
    pub fn layout(&mut self, area: Rect) -> Rect {
        // fields, a blank line, the error line and the hint line, plus borders
        let height = u16::try_from(self.fields.len()).unwrap_or(u16::MAX).saturating_add(5);
        let popup = area.centered(Constraint::Percentage(60), Constraint::Length(height));
        let icon_width = u16::try_from(CLOSE_ICON.len()).unwrap_or(3);

        self.popup_area = popup;
        self.close_area = Rect::new(
            popup.x + popup.width.saturating_sub(icon_width + 1),
            popup.y,
            icon_width,
            1,
        );
        self.field_areas = (0..self.fields.len())
            .map(|i| {
                let row = popup.y + 1 + u16::try_from(i).unwrap_or(u16::MAX);
                Rect::new(popup.x + 1, row, popup.width.saturating_sub(2), 1)
            })
            .collect();
        popup
    }

    fn field_line(&self, index: usize, theme: &Theme) -> Line<'static> {
        let field = &self.fields[index];
        let focused = index == self.focus;
        let label_style = if focused {
            Style::default()
                .fg(theme.lavender())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.subtext0())
        };
        let marker = if focused { "▶ " } else { "  " };

        let mut spans = vec![
            Span::styled(marker, Style::default().fg(theme.mauve())),
            Span::styled(format!("{:<LABEL_WIDTH$}", field.label), label_style),
        ];
        match &field.kind {
            FieldKind::Input(input) => spans.extend(input.line(focused, theme).spans),
            FieldKind::Checkbox { checked, .. } => {
                let (mark, color) = if *checked {
                    ("[✓]", theme.green())
                } else {
                    ("[ ]", theme.overlay1())
                };
                let mut style = Style::default().fg(color);
                if focused {
                    style = style.bg(theme.surface1());
                }
                spans.push(Span::styled(mark, style));
            }
        }
        Line::from(spans)
    }

    fn hint_line(&self, theme: &Theme) -> Line<'static> {
        let key_style = Style::default().fg(theme.peach());
        let text_style = Style::default().fg(theme.overlay1());
        Line::from(vec![
            Span::styled(self.resolver.display_form(FormAction::Submit), key_style),
            Span::styled(" save  ", text_style),
            Span::styled(self.resolver.display_form(FormAction::Cancel), key_style),
            Span::styled(" cancel  ", text_style),
            Span::styled(self.resolver.display_form(FormAction::NextField), key_style),
            Span::styled(" next field  ", text_style),
            Span::styled(self.resolver.display_form(FormAction::Toggle), key_style),
            Span::styled(" toggle", text_style),
        ])
    }
}

impl Component for Form {
    type Output = FormEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_form(&key, FormAction::Cancel) {
            return Ok(FormEvent::Cancelled.into());
        }
        if self.resolver.matches_form(&key, FormAction::Submit) {
            return Ok(FormEvent::Submitted.into());
        }
        if self.resolver.matches_form(&key, FormAction::NextField) {
            self.focus_next();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_form(&key, FormAction::PrevField) {
            self.focus_previous();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_form(&key, FormAction::Toggle) && self.toggle_focused() {
            return Ok(EventResult::Consumed);
        }

        if let Some(FormField {
            kind: FieldKind::Input(input),
            ..
        }) = self.fields.get_mut(self.focus)
            && input.handle_key(key)
        {
            self.dirty = true;
        }
        // Capture everything while open
        Ok(EventResult::Consumed)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(EventResult::Consumed);
        }
        let (column, row) = (mouse.column, mouse.row);

        if contains(self.close_area, column, row) || !contains(self.popup_area, column, row) {
            return Ok(FormEvent::Cancelled.into());
        }

        if let Some(index) = self
            .field_areas
            .iter()
            .position(|area| contains(*area, column, row))
        {
            self.focus = index;
            self.toggle_focused();
        }
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup = self.layout(area);
        frame.render_widget(Clear, popup);

        let mut lines: Vec<Line> = (0..self.fields.len())
            .map(|i| self.field_line(i, theme))
            .collect();
        lines.push(Line::from(""));
        lines.push(self.error.as_ref().map_or_else(
            || Line::from(""),
            |error| {
                Line::from(Span::styled(
                    format!("  ✗ {error}"),
                    Style::default().fg(theme.red()).add_modifier(Modifier::BOLD),
                ))
            },
        ));
        lines.push(self.hint_line(theme));

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .title_top(
                Line::from(Span::styled(CLOSE_ICON, Style::default().fg(theme.red()))).right_aligned(),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender()))
            .style(Style::default().bg(theme.base()));

        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keybindings::KeybindingsConfig;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn form() -> Form {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        Form::new(
            vec![
                FormField::text("name", "Name", "e.g. Gold Stack"),
                FormField::number("price", "Price", "1000"),
                FormField::checkbox("enabled", "Enabled", true),
            ],
            resolver,
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut form = form();
        form.handle_key(key(KeyCode::Char('G'))).unwrap();
        form.handle_key(key(KeyCode::Tab)).unwrap();
        form.handle_key(key(KeyCode::Char('5'))).unwrap();

        assert_eq!(form.value("name"), "G");
        assert_eq!(form.value("price"), "5");
        assert!(form.is_dirty());
    }

    #[test]
    fn test_focus_wraps_both_ways() {
        let mut form = form();
        form.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT))
            .unwrap();
        assert_eq!(form.focused(), Some("enabled"));

        form.handle_key(key(KeyCode::Down)).unwrap();
        assert_eq!(form.focused(), Some("name"));
    }

    #[test]
    fn test_space_toggles_checkbox_but_types_in_text() {
        let mut form = form();
        form.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert_eq!(form.value("name"), " ");

        form.focus_field("enabled");
        form.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert!(!form.checked("enabled"));
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut form = form();
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)).unwrap(),
            EventResult::Event(FormEvent::Submitted)
        );
        assert_eq!(
            form.handle_key(key(KeyCode::Esc)).unwrap(),
            EventResult::Event(FormEvent::Cancelled)
        );
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut form = form();
        form.set_value("name", "Gold");
        form.set_checked("enabled", false);
        form.set_error(Some("boom".to_string()));
        form.focus_field("price");

        form.reset();

        assert_eq!(form.value("name"), "");
        assert!(form.checked("enabled"));
        assert!(form.error().is_none());
        assert!(!form.is_dirty());
        assert_eq!(form.focused(), Some("name"));
    }

    #[test]
    fn test_programmatic_fill_is_not_dirty() {
        let mut form = form();
        form.set_value("name", "Gold");
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_click_on_backdrop_cancels() {
        let mut form = form();
        let popup = form.layout(Rect::new(0, 0, 100, 40));

        assert_eq!(
            form.handle_mouse(click(0, 0)).unwrap(),
            EventResult::Event(FormEvent::Cancelled)
        );
        assert_eq!(
            form.handle_mouse(click(popup.x + 2, popup.y + 1)).unwrap(),
            EventResult::Consumed
        );
    }

    #[test]
    fn test_click_on_close_icon_cancels() {
        let mut form = form();
        let popup = form.layout(Rect::new(0, 0, 100, 40));
        let icon_x = popup.x + popup.width - 3;

        assert_eq!(
            form.handle_mouse(click(icon_x, popup.y)).unwrap(),
            EventResult::Event(FormEvent::Cancelled)
        );
    }

    #[test]
    fn test_click_on_checkbox_row_toggles() {
        let mut form = form();
        let popup = form.layout(Rect::new(0, 0, 100, 40));

        form.handle_mouse(click(popup.x + 5, popup.y + 3)).unwrap();
        assert_eq!(form.focused(), Some("enabled"));
        assert!(!form.checked("enabled"));
    }
}
