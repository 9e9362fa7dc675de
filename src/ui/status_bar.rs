use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction, SearchAction};
use crate::ui::Keybinding;

const LOGO: &[&str] = &[
    r"   ___   ",
    r"  (___)  ",
    r"  (___)  ",
    r"  (___)  ",
    r" stackadmin",
];

/// One labelled value in the status column, such as a row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub label: &'static str,
    pub value: String,
}

impl StatusEntry {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

pub struct StatusBar {
    resolver: Arc<KeyResolver>,
}

impl StatusBar {
    pub const fn new(resolver: Arc<KeyResolver>) -> Self {
        Self { resolver }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        breadcrumbs: &[String],
        entries: &[StatusEntry],
        local_keybindings: &[Keybinding],
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.surface1()));

        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        let [status, keys, logo] = Layout::horizontal([
            Constraint::Length(36),
            Constraint::Min(20),
            Constraint::Length(12),
        ])
        .areas(inner_area);

        Self::render_status_info(frame, status, theme, breadcrumbs, entries);
        self.render_keybindings(frame, keys, theme, local_keybindings);
        Self::render_logo(frame, logo, theme);
    }

    fn render_status_info(
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        breadcrumbs: &[String],
        entries: &[StatusEntry],
    ) {
        let w = area.width as usize;
        let label_style = Style::default().fg(theme.overlay1());
        let value_style = Style::default().fg(theme.text());

        let mut lines = vec![
            Line::from(Span::styled(
                truncate_str(&breadcrumbs.join(" › "), w),
                Style::default()
                    .fg(theme.lavender())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(
            entries
                .iter()
                .map(|entry| status_line(entry.label, &entry.value, w, label_style, value_style)),
        );

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_keybindings(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        local_keybindings: &[Keybinding],
    ) {
        let global_keybindings = self.global_keybindings();

        // Local hints first, then global
        let hints: Vec<&Keybinding> = local_keybindings
            .iter()
            .chain(global_keybindings.iter())
            .filter(|kb| kb.hint)
            .collect();

        if hints.is_empty() || area.height == 0 {
            return;
        }

        // Align the separator into one straight column
        let max_key_w = hints.iter().map(|kb| kb.key.chars().count()).max().unwrap_or(1);
        let max_desc_w = hints
            .iter()
            .map(|kb| kb.description.chars().count())
            .max()
            .unwrap_or(1);
        let col_width = u16::try_from(max_key_w + 3 + max_desc_w + 2).unwrap_or(u16::MAX);
        let num_cols = (area.width / col_width).max(1) as usize;
        let num_rows = area.height as usize;

        let mut columns: Vec<Vec<Line>> = vec![Vec::new(); num_cols];
        for (i, kb) in hints.iter().enumerate() {
            let col_idx = i / num_rows;
            if col_idx >= num_cols {
                break;
            }
            columns[col_idx].push(Line::from(vec![
                Span::styled(
                    format!("{:>max_key_w$}", kb.key),
                    Style::default().fg(theme.peach()),
                ),
                Span::styled(" │ ", Style::default().fg(theme.surface2())),
                Span::styled(kb.description.clone(), Style::default().fg(theme.subtext0())),
            ]));
        }

        let col_areas = Layout::horizontal(vec![Constraint::Length(col_width); num_cols]).split(area);
        for (lines, col_area) in columns.into_iter().zip(col_areas.iter()) {
            frame.render_widget(Paragraph::new(lines), *col_area);
        }
    }

    fn render_logo(frame: &mut Frame, area: Rect, theme: &Theme) {
        let style = Style::default()
            .fg(theme.mauve())
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = LOGO
            .iter()
            .map(|line| Line::from(Span::styled(*line, style)))
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    /// Keybindings that apply everywhere.
    pub fn global_keybindings(&self) -> Vec<Keybinding> {
        vec![
            Keybinding::hint(self.resolver.display_global(GlobalAction::Help), "Help"),
            Keybinding::hint(self.resolver.display_global(GlobalAction::Quit), "Quit"),
            Keybinding::new(self.resolver.display_global(GlobalAction::Back), "Back"),
            Keybinding::new(self.resolver.display_search(SearchAction::Toggle), "Search"),
            Keybinding::new(
                format!(
                    "{}/{}",
                    self.resolver.display_nav(NavAction::Up),
                    self.resolver.display_nav(NavAction::Down)
                ),
                "Navigate",
            ),
        ]
    }
}

/// Render a labelled status line: right-aligned label, then value.
fn status_line<'a>(
    label: &'a str,
    value: &str,
    max_width: usize,
    label_style: Style,
    value_style: Style,
) -> Line<'a> {
    const LABEL_W: usize = 10;
    let available = max_width.saturating_sub(LABEL_W + 1);
    Line::from(vec![
        Span::styled(format!("{label:>LABEL_W$}"), label_style),
        Span::raw(" "),
        Span::styled(truncate_str(value, available), value_style),
    ])
}

/// Truncate a string to fit within a given width, adding "..." if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Gold", 10), "Gold");
        assert_eq!(truncate_str("Gold Stack Deluxe", 10), "Gold St...");
        assert_eq!(truncate_str("Gold", 2), "Go");
        assert_eq!(truncate_str("Ünïcödé stack", 8), "Ünïcö...");
    }
}
