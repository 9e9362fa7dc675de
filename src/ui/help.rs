use std::sync::Arc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver};
use crate::ui::{Component, EventResult, Keybinding, Result};

/// A titled group of keybindings.
pub struct KeybindingSection {
    pub title: String,
    pub keybindings: Vec<Keybinding>,
}

impl KeybindingSection {
    pub fn new(title: impl Into<String>, keybindings: Vec<Keybinding>) -> Self {
        Self {
            title: title.into(),
            keybindings,
        }
    }
}

pub enum HelpEvent {
    Close,
}

/// Overlay listing every keybinding, hints or not.
pub struct HelpOverlay {
    sections: Vec<KeybindingSection>,
    resolver: Arc<KeyResolver>,
}

impl HelpOverlay {
    pub const fn new(sections: Vec<KeybindingSection>, resolver: Arc<KeyResolver>) -> Self {
        Self { sections, resolver }
    }
}

impl Component for HelpOverlay {
    type Output = HelpEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_global(&key, GlobalAction::Help)
            || self.resolver.matches_global(&key, GlobalAction::Back)
        {
            return Ok(HelpEvent::Close.into());
        }
        Ok(EventResult::Consumed)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<EventResult<Self::Output>> {
        Ok(match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => HelpEvent::Close.into(),
            _ => EventResult::Consumed,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = area.centered(Constraint::Percentage(60), Constraint::Percentage(70));
        frame.render_widget(Clear, popup_area);

        let key_style = Style::default()
            .fg(theme.peach())
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(theme.text());
        let section_style = Style::default()
            .fg(theme.subtext0())
            .add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                format!("── {} ──", section.title),
                section_style,
            )));
            for kb in &section.keybindings {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:>14}", kb.key), key_style),
                    Span::raw("  "),
                    Span::styled(kb.description.clone(), desc_style),
                ]));
            }
        }

        let title = format!(
            " Help (press {} to close) ",
            self.resolver.display_global(GlobalAction::Help)
        );
        let block = Block::default()
            .title(title)
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender()))
            .style(Style::default().bg(theme.base()));

        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}
