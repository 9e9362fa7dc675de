use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Paragraph, Row, Table as TableWidget, TableState,
};

use crate::Theme;
use crate::config::{KeyResolver, NavAction, SearchAction};
use crate::ui::{Component, EventResult, Result};

const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<T> {
    Changed(T),
    Activated(T),
    SearchChanged(String),
}

pub struct ColumnDef {
    pub header: &'static str,
    pub constraint: Constraint,
}

impl ColumnDef {
    pub const fn new(header: &'static str, constraint: Constraint) -> Self {
        Self { header, constraint }
    }
}

pub trait TableRow {
    fn columns() -> &'static [ColumnDef];
    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>>;

    /// Override to render cells differently based on the current search query.
    fn render_cells_with_query(&self, theme: &Theme, query: &str) -> Vec<Cell<'static>> {
        _ = query;
        self.render_cells(theme)
    }

    /// Return true if this row matches the search query for local filtering.
    fn matches(&self, query: &str) -> bool;
}

/// Selectable table with a `/` search filter.
pub struct Table<T: TableRow + Clone> {
    items: Vec<T>,
    filtered_indices: Vec<usize>,
    state: TableState,
    title: Option<String>,
    empty_message: &'static str,
    searching: bool,
    query: String,
    resolver: Arc<KeyResolver>,
}

impl<T: TableRow + Clone> Table<T> {
    pub fn new(items: Vec<T>, resolver: Arc<KeyResolver>) -> Self {
        let mut table = Self {
            items: Vec::new(),
            filtered_indices: Vec::new(),
            state: TableState::default(),
            title: None,
            empty_message: "Nothing here yet",
            searching: false,
            query: String::new(),
            resolver,
        };
        table.set_items(items);
        table
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub const fn with_empty_message(mut self, message: &'static str) -> Self {
        self.empty_message = message;
        self
    }

    /// Replace the rows, keeping the search query and the selection position.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.update_filter();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of rows passing the current filter.
    pub const fn visible_len(&self) -> usize {
        self.filtered_indices.len()
    }

    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn selected_item(&self) -> Option<&T> {
        let selected = self.state.selected()?;
        let &idx = self.filtered_indices.get(selected)?;
        self.items.get(idx)
    }

    fn update_filter(&mut self) {
        self.filtered_indices = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.query.is_empty() || item.matches(&self.query))
            .map(|(i, _)| i)
            .collect();

        match self.state.selected() {
            _ if self.filtered_indices.is_empty() => self.state.select(None),
            Some(i) if i >= self.filtered_indices.len() => {
                self.state.select(Some(self.filtered_indices.len() - 1));
            }
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    fn select(&mut self, index: usize) {
        if !self.filtered_indices.is_empty() {
            self.state
                .select(Some(index.min(self.filtered_indices.len() - 1)));
        }
    }

    fn change_event(&self, before: Option<usize>) -> EventResult<TableEvent<T>> {
        if self.state.selected() != before
            && let Some(item) = self.selected_item()
        {
            return TableEvent::Changed(item.clone()).into();
        }
        EventResult::Consumed
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> EventResult<TableEvent<T>> {
        if self.resolver.matches_search(&key, SearchAction::Exit) {
            self.searching = false;
            let had_query = !self.query.is_empty();
            self.query.clear();
            self.update_filter();
            return if had_query {
                TableEvent::SearchChanged(String::new()).into()
            } else {
                EventResult::Consumed
            };
        }

        // Enter leaves search mode but keeps the filter
        if self.resolver.matches_nav(&key, NavAction::Select) {
            self.searching = false;
            return EventResult::Consumed;
        }

        match key.code {
            KeyCode::Backspace => {
                self.query.pop();
                self.update_filter();
                TableEvent::SearchChanged(self.query.clone()).into()
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.update_filter();
                TableEvent::SearchChanged(self.query.clone()).into()
            }
            _ => EventResult::Consumed,
        }
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) -> EventResult<TableEvent<T>> {
        let before = self.state.selected();
        let current = before.unwrap_or(0);

        let target = if self.resolver.matches_nav(&key, NavAction::Down) {
            Some(current + 1)
        } else if self.resolver.matches_nav(&key, NavAction::Up) {
            Some(current.saturating_sub(1))
        } else if self.resolver.matches_nav(&key, NavAction::Home) {
            Some(0)
        } else if self.resolver.matches_nav(&key, NavAction::End) {
            Some(usize::MAX)
        } else if self.resolver.matches_nav(&key, NavAction::PageDown) {
            Some(current + PAGE_STEP)
        } else if self.resolver.matches_nav(&key, NavAction::PageUp) {
            Some(current.saturating_sub(PAGE_STEP))
        } else {
            None
        };
        if let Some(target) = target {
            self.select(target);
            return self.change_event(before);
        }

        if self.resolver.matches_nav(&key, NavAction::Select) {
            return self
                .selected_item()
                .map_or(EventResult::Ignored, |item| {
                    TableEvent::Activated(item.clone()).into()
                });
        }
        if self.resolver.matches_search(&key, SearchAction::Toggle) {
            self.searching = true;
            return EventResult::Consumed;
        }
        if self.resolver.matches_search(&key, SearchAction::Exit) && !self.query.is_empty() {
            self.query.clear();
            self.update_filter();
            return TableEvent::SearchChanged(String::new()).into();
        }

        EventResult::Ignored
    }
}

impl<T: TableRow + Clone> Component for Table<T> {
    type Output = TableEvent<T>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(if self.searching {
            self.handle_search_key(key)
        } else {
            self.handle_navigation_key(key)
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let has_search_bar = self.searching || !self.query.is_empty();
        let (table_area, search_area) = if has_search_bar {
            let [table, search] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
            (table, Some(search))
        } else {
            (area, None)
        };

        let columns = T::columns();
        let header = Row::new(columns.iter().map(|c| {
            Cell::from(c.header).style(
                Style::default()
                    .fg(theme.header())
                    .add_modifier(Modifier::BOLD),
            )
        }))
        .height(1)
        .style(Style::default().bg(theme.surface0()));

        let rows: Vec<Row> = self
            .filtered_indices
            .iter()
            .map(|&idx| {
                Row::new(self.items[idx].render_cells_with_query(theme, &self.query))
                    .style(Style::default().fg(theme.text()))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()))
            .title(self.title.clone().unwrap_or_default())
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            );

        if rows.is_empty() {
            let message = if self.query.is_empty() {
                self.empty_message.to_string()
            } else {
                format!("No rows match '{}'", self.query)
            };
            let paragraph = Paragraph::new(message)
                .style(Style::default().fg(theme.overlay1()))
                .centered()
                .block(block);
            frame.render_widget(paragraph, table_area);
        } else {
            let widths: Vec<Constraint> = columns.iter().map(|c| c.constraint).collect();
            let table = TableWidget::new(rows, widths)
                .header(header)
                .row_highlight_style(
                    Style::default()
                        .bg(theme.selection_bg())
                        .fg(theme.lavender())
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ")
                .block(block);
            frame.render_stateful_widget(table, table_area, &mut self.state);
        }

        if let Some(search_area) = search_area {
            let (search_text, search_style) = if self.searching {
                (
                    format!("/{}_", self.query),
                    Style::default().fg(theme.yellow()),
                )
            } else {
                (
                    format!("/{} ({} matches)", self.query, self.filtered_indices.len()),
                    Style::default().fg(theme.subtext0()),
                )
            };
            frame.render_widget(Paragraph::new(search_text).style(search_style), search_area);
        }
    }
}
