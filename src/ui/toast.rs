use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::Theme;
use crate::ui::Component;

const TOAST_DURATION: Duration = Duration::from_secs(3);
const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    message: String,
    toast_type: ToastType,
    created_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, toast_type: ToastType) -> Self {
        Self {
            message: message.into(),
            toast_type,
            created_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn toast_type(&self) -> ToastType {
        self.toast_type
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= TOAST_DURATION
    }
}

/// Stack of transient notifications in the bottom-right corner.
#[derive(Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, toast: Toast) {
        self.toasts.push_back(toast);
        while self.toasts.len() > MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    pub fn toasts(&self) -> impl DoubleEndedIterator<Item = &Toast> {
        self.toasts.iter()
    }

    fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }
}

impl Component for ToastManager {
    type Output = ();

    fn handle_tick(&mut self) {
        self.expire(Instant::now());
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let toast_height = 3u16;
        let toast_width = 50u16.min(area.width.saturating_sub(4));
        let spacing = 1u16;

        // Newest toast sits at the bottom
        for (i, toast) in self.toasts().rev().enumerate() {
            let y_offset = u16::try_from(i).unwrap_or(u16::MAX) * (toast_height + spacing);
            let Some(y) = area
                .bottom()
                .checked_sub(toast_height + y_offset + 1)
                .filter(|y| *y >= area.y)
            else {
                break;
            };
            let x = area.x + area.width.saturating_sub(toast_width + 2);
            let toast_area = Rect::new(x, y, toast_width, toast_height);

            let (border_color, icon) = match toast.toast_type() {
                ToastType::Success => (theme.green(), "✓"),
                ToastType::Info => (theme.blue(), "ℹ"),
                ToastType::Error => (theme.red(), "✗"),
            };

            frame.render_widget(Clear, toast_area);

            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color))
                .style(Style::default().bg(theme.surface0()));

            let paragraph = Paragraph::new(format!("{icon} {}", toast.message()))
                .style(
                    Style::default()
                        .fg(theme.text())
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);

            frame.render_widget(paragraph, toast_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_at_most_three() {
        let mut manager = ToastManager::new();
        for i in 0..5 {
            manager.show(Toast::new(format!("toast {i}"), ToastType::Info));
        }
        let messages: Vec<_> = manager.toasts().map(Toast::message).collect();
        assert_eq!(messages, vec!["toast 2", "toast 3", "toast 4"]);
    }

    #[test]
    fn test_toasts_expire() {
        let mut manager = ToastManager::new();
        manager.show(Toast::new("Stack created successfully!", ToastType::Success));

        manager.expire(Instant::now());
        assert_eq!(manager.toasts().count(), 1);

        manager.expire(Instant::now() + TOAST_DURATION);
        assert_eq!(manager.toasts().count(), 0);
    }
}
