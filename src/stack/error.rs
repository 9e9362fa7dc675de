use thiserror::Error;

use crate::stack::model::StackId;

/// A named field of the stack form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackField {
    Name,
    Description,
    BetPrice,
    WinningProbability,
    FeePercentage,
    Enabled,
}

impl StackField {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Description,
        Self::BetPrice,
        Self::WinningProbability,
        Self::FeePercentage,
        Self::Enabled,
    ];

    /// Form field name, as used by the markup contract.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::BetPrice => "bet_price",
            Self::WinningProbability => "winning_probability",
            Self::FeePercentage => "fee_percentage",
            Self::Enabled => "enabled",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::BetPrice => "Bet Price (sats)",
            Self::WinningProbability => "Winning Probability (0-1)",
            Self::FeePercentage => "Fee Percentage (0-100)",
            Self::Enabled => "Enabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    Missing(StackField),
    #[error("{}: '{value}' is not a whole number", .field.label())]
    NotAnInteger { field: StackField, value: String },
    #[error("{}: '{value}' is not a number", .field.label())]
    NotANumber { field: StackField, value: String },
    #[error("{}: {value} must be between {min} and {max}", .field.label())]
    OutOfRange {
        field: StackField,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    pub const fn field(&self) -> StackField {
        match self {
            Self::Missing(field)
            | Self::NotAnInteger { field, .. }
            | Self::NotANumber { field, .. }
            | Self::OutOfRange { field, .. } => *field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("stack '{0}' no longer exists")]
    NotFound(StackId),
    #[error("storage failure: {0}")]
    Persistence(String),
}
