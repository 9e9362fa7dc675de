use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::Theme;

/// Which characters a [`TextInput`] accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputKind {
    #[default]
    Text,
    /// Digits, sign, decimal point and exponent only.
    Number,
}

/// Single-line editor embedded in forms.
///
/// The cursor is a character index, so multibyte input edits cleanly.
/// Keys the editor does not understand are left to the owner.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    placeholder: Option<String>,
    kind: InputKind,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub const fn numeric(mut self) -> Self {
        self.kind = InputKind::Number;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the content and move the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn accepts(&self, c: char) -> bool {
        match self.kind {
            InputKind::Text => !c.is_control(),
            InputKind::Number => c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'),
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn delete_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_char_at_cursor(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1] == ' ' {
            pos -= 1;
        }
        while pos > 0 && chars[pos - 1] != ' ' {
            pos -= 1;
        }
        let (start, end) = (self.byte_index(pos), self.byte_index(self.cursor));
        self.value.drain(start..end);
        self.cursor = pos;
    }

    /// Apply an editing key. Returns `false` if the key is not an editing key.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::ALT) | (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                self.delete_word_before_cursor();
            }
            (KeyCode::Backspace, _) => self.delete_char_before_cursor(),
            (KeyCode::Delete, _) => self.delete_char_at_cursor(),
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.len()),
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => self.cursor = 0,
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.len();
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear(),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) if self.accepts(c) => {
                self.insert_char(c);
            }
            _ => return false,
        }
        true
    }

    /// Render the value as a single line, drawing the cursor when focused.
    pub fn line(&self, focused: bool, theme: &Theme) -> Line<'static> {
        let input_style = Style::default().fg(theme.text());
        let placeholder_style = Style::default().fg(theme.overlay0());
        let cursor_style = Style::default()
            .fg(theme.base())
            .bg(theme.text())
            .add_modifier(Modifier::BOLD);

        if self.value.is_empty() {
            let placeholder = self.placeholder.clone().unwrap_or_default();
            return if focused {
                Line::from(vec![
                    Span::styled(" ", cursor_style),
                    Span::styled(placeholder, placeholder_style),
                ])
            } else {
                Line::from(Span::styled(placeholder, placeholder_style))
            };
        }

        if !focused {
            return Line::from(Span::styled(self.value.clone(), input_style));
        }

        let before: String = self.value.chars().take(self.cursor).collect();
        let cursor_char = self.value.chars().nth(self.cursor).unwrap_or(' ');
        let after: String = self.value.chars().skip(self.cursor + 1).collect();

        Line::from(vec![
            Span::styled(before, input_style),
            Span::styled(cursor_char.to_string(), cursor_style),
            Span::styled(after, input_style),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut TextInput, text: &str) {
        for c in text.chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = TextInput::new();
        type_str(&mut input, "Gold");
        assert_eq!(input.value(), "Gold");

        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "Gol");
    }

    #[test]
    fn test_insert_in_middle() {
        let mut input = TextInput::new();
        type_str(&mut input, "Gld");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Char('o')));
        assert_eq!(input.value(), "Gold");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = TextInput::new();
        type_str(&mut input, "Öre ⚡");
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "Öre ");

        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value(), "re ");
    }

    #[test]
    fn test_delete_word() {
        let mut input = TextInput::new();
        input.set_value("Gold Stack  ");
        input.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT));
        assert_eq!(input.value(), "Gold ");
    }

    #[test]
    fn test_clear_line() {
        let mut input = TextInput::new();
        input.set_value("1000");
        input.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn test_numeric_rejects_letters() {
        let mut input = TextInput::new().numeric();
        type_str(&mut input, "0.4x5");
        assert_eq!(input.value(), "0.45");
    }

    #[test]
    fn test_non_editing_keys_are_left_to_owner() {
        let mut input = TextInput::new();
        assert!(!input.handle_key(key(KeyCode::Tab)));
        assert!(!input.handle_key(key(KeyCode::Enter)));
        assert!(!input.handle_key(key(KeyCode::Esc)));
    }
}
