use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{DialogAction, KeyResolver};
use crate::ui::{Component, EventResult, Result, contains};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ConfirmStyle {
    #[default]
    Normal,
    Danger,
}

pub struct ConfirmDialog {
    title: String,
    message: String,
    confirm_text: String,
    cancel_text: String,
    style: ConfirmStyle,
    popup_area: Rect,
    resolver: Arc<KeyResolver>,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            title: "Confirm".to_string(),
            message: message.into(),
            confirm_text: "Yes".to_string(),
            cancel_text: "No".to_string(),
            style: ConfirmStyle::Normal,
            popup_area: Rect::default(),
            resolver,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    /// Shows red warning styling.
    pub const fn danger(mut self) -> Self {
        self.style = ConfirmStyle::Danger;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Component for ConfirmDialog {
    type Output = ConfirmEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_dialog(&key, DialogAction::Confirm) {
            return Ok(ConfirmEvent::Confirmed.into());
        }
        if self.resolver.matches_dialog(&key, DialogAction::Cancel) {
            return Ok(ConfirmEvent::Cancelled.into());
        }
        Ok(EventResult::Consumed)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        let outside = !contains(self.popup_area, mouse.column, mouse.row);
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) && outside {
            return Ok(ConfirmEvent::Cancelled.into());
        }
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = area.centered(Constraint::Percentage(50), Constraint::Length(7));
        self.popup_area = popup_area;
        frame.render_widget(Clear, popup_area);

        let (title_color, border_color, confirm_color) = match self.style {
            ConfirmStyle::Normal => (theme.mauve(), theme.lavender(), theme.green()),
            ConfirmStyle::Danger => (theme.red(), theme.red(), theme.red()),
        };

        let key_style = Style::default()
            .fg(theme.peach())
            .add_modifier(Modifier::BOLD);
        let confirm_style = Style::default()
            .fg(confirm_color)
            .add_modifier(Modifier::BOLD);
        let cancel_style = Style::default()
            .fg(theme.overlay1())
            .add_modifier(Modifier::BOLD);

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message.clone(),
                Style::default().fg(theme.text()),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("[{}]", self.resolver.display_dialog(DialogAction::Confirm)),
                    key_style,
                ),
                Span::raw(" "),
                Span::styled(self.confirm_text.clone(), confirm_style),
                Span::raw("    "),
                Span::styled(
                    format!("[{}]", self.resolver.display_dialog(DialogAction::Cancel)),
                    key_style,
                ),
                Span::raw(" "),
                Span::styled(self.cancel_text.clone(), cancel_style),
            ]),
        ];

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(title_color)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme.base()));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keybindings::KeybindingsConfig;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn dialog() -> ConfirmDialog {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        ConfirmDialog::new("Sure?", resolver).danger()
    }

    #[test]
    fn test_answers() {
        let mut dialog = dialog();
        let yes = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE);
        let no = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let other = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);

        assert_eq!(
            dialog.handle_key(yes).unwrap(),
            EventResult::Event(ConfirmEvent::Confirmed)
        );
        assert_eq!(
            dialog.handle_key(no).unwrap(),
            EventResult::Event(ConfirmEvent::Cancelled)
        );
        assert_eq!(dialog.handle_key(other).unwrap(), EventResult::Consumed);
    }

    #[test]
    fn test_click_outside_cancels() {
        let mut dialog = dialog();
        dialog.popup_area = Rect::new(10, 10, 20, 7);
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        assert_eq!(
            dialog.handle_mouse(click(12, 12)).unwrap(),
            EventResult::Consumed
        );
        assert_eq!(
            dialog.handle_mouse(click(0, 0)).unwrap(),
            EventResult::Event(ConfirmEvent::Cancelled)
        );
    }
}
