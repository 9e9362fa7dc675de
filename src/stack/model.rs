use std::fmt;

use chrono::{DateTime, Utc};
use ratatui::layout::Constraint;
use ratatui::style::Style;
use ratatui::widgets::Cell;
use serde::{Deserialize, Serialize};

use crate::Theme;
use crate::search::Matcher;
use crate::ui::{ColumnDef, TableRow};

/// Identifier of a stack record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(String);

impl StackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Writable fields of a stack, as submitted by the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bet_price: i64,
    pub winning_probability: f64,
    pub fee_percentage: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// A stack record as stored.
///
/// `current_amount` is the pot. Bets and payouts move it outside this panel,
/// so here it is read-only: zero for new stacks, or whatever the seed holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: StackId,
    pub name: String,
    pub description: String,
    pub current_amount: i64,
    pub bet_price: i64,
    pub winning_probability: f64,
    pub fee_percentage: f64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Stack {
    pub fn from_payload(id: StackId, payload: StackPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: payload.name,
            description: payload.description,
            current_amount: 0,
            bet_price: payload.bet_price,
            winning_probability: payload.winning_probability,
            fee_percentage: payload.fee_percentage,
            enabled: payload.enabled,
            created_at,
        }
    }

    /// Overwrite the writable fields, keeping id, pot and creation time.
    pub fn apply(&mut self, payload: StackPayload) {
        self.name = payload.name;
        self.description = payload.description;
        self.bet_price = payload.bet_price;
        self.winning_probability = payload.winning_probability;
        self.fee_percentage = payload.fee_percentage;
        self.enabled = payload.enabled;
    }

    pub fn payload(&self) -> StackPayload {
        StackPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            bet_price: self.bet_price,
            winning_probability: self.winning_probability,
            fee_percentage: self.fee_percentage,
            enabled: self.enabled,
        }
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl TableRow for Stack {
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("Name", Constraint::Min(20)),
            ColumnDef::new("Bet Price", Constraint::Length(12)),
            ColumnDef::new("Win %", Constraint::Length(8)),
            ColumnDef::new("Fee %", Constraint::Length(8)),
            ColumnDef::new("Pot", Constraint::Length(12)),
            ColumnDef::new("Status", Constraint::Length(10)),
            ColumnDef::new("Created", Constraint::Length(18)),
        ];
        COLUMNS
    }

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>> {
        let status = if self.enabled {
            Cell::from("enabled").style(Style::default().fg(theme.green()))
        } else {
            Cell::from("disabled").style(Style::default().fg(theme.overlay1()))
        };

        vec![
            Cell::from(self.name.clone()),
            Cell::from(format!("{} sats", self.bet_price)),
            Cell::from(format!("{:.1}", self.winning_probability * 100.0)),
            Cell::from(format!("{:.1}", self.fee_percentage)),
            Cell::from(format!("{} sats", self.current_amount)),
            status,
            Cell::from(self.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]
    }

    fn matches(&self, query: &str) -> bool {
        Matcher::new().matches_any([self.name.as_str(), self.description.as_str()], query)
    }
}

/// A payout from a stack's pot to a winning bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinHistory {
    pub id: String,
    pub stack_id: StackId,
    pub bet_id: String,
    pub amount_won: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TableRow for WinHistory {
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("Time", Constraint::Length(18)),
            ColumnDef::new("Stack", Constraint::Length(8)),
            ColumnDef::new("Bet", Constraint::Min(12)),
            ColumnDef::new("Winner", Constraint::Min(12)),
            ColumnDef::new("Amount Won", Constraint::Length(14)),
        ];
        COLUMNS
    }

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>> {
        let winner = self.user_id.as_ref().map_or_else(
            || Cell::from("anonymous").style(Style::default().fg(theme.overlay1())),
            |user| Cell::from(user.clone()),
        );
        vec![
            Cell::from(self.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::from(self.stack_id.to_string()),
            Cell::from(self.bet_id.clone()),
            winner,
            Cell::from(format!("{} sats", self.amount_won)).style(Style::default().fg(theme.green())),
        ]
    }

    fn matches(&self, query: &str) -> bool {
        Matcher::new().matches_any(
            [
                self.bet_id.as_str(),
                self.user_id.as_deref().unwrap_or_default(),
            ],
            query,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults_from_json() {
        let payload: StackPayload = serde_json::from_str(
            r#"{"name":"Gold","bet_price":1000,"winning_probability":0.5,"fee_percentage":2.0}"#,
        )
        .unwrap();
        assert_eq!(payload.description, "");
        assert!(payload.enabled);
    }

    #[test]
    fn test_apply_keeps_identity_and_pot() {
        let created_at = Utc::now();
        let mut stack = Stack::from_payload(
            StackId::new("1"),
            StackPayload {
                name: "Gold".to_string(),
                description: String::new(),
                bet_price: 100,
                winning_probability: 0.1,
                fee_percentage: 1.0,
                enabled: true,
            },
            created_at,
        );
        stack.current_amount = 500;

        stack.apply(StackPayload {
            name: "Silver".to_string(),
            description: "cheaper".to_string(),
            bet_price: 10,
            winning_probability: 0.2,
            fee_percentage: 0.5,
            enabled: false,
        });

        assert_eq!(stack.id, StackId::new("1"));
        assert_eq!(stack.current_amount, 500);
        assert_eq!(stack.created_at, created_at);
        assert_eq!(stack.name, "Silver");
        assert!(!stack.enabled);
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let stack = Stack::from_payload(
            StackId::new("1"),
            StackPayload {
                name: "Gold Stack".to_string(),
                description: "high roller".to_string(),
                bet_price: 100,
                winning_probability: 0.1,
                fee_percentage: 1.0,
                enabled: true,
            },
            Utc::now(),
        );
        assert!(stack.matches("gold"));
        assert!(stack.matches("roller"));
        assert!(!stack.matches("xyz"));
    }

    #[test]
    fn test_win_history_from_json() {
        let win: WinHistory = serde_json::from_str(
            r#"{"id":"w1","stack_id":"1","bet_id":"b7","amount_won":5400,"timestamp":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(win.stack_id, StackId::new("1"));
        assert!(win.user_id.is_none());
        assert!(win.matches("b7"));
    }
}
