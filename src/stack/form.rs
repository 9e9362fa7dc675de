//! Form snapshot and its mapping onto [`StackPayload`].

use crate::stack::error::{StackField, ValidationError};
use crate::stack::model::StackPayload;

const MIN_BET_PRICE: i64 = 1;
const PROBABILITY_RANGE: (f64, f64) = (0.0, 1.0);
const FEE_RANGE: (f64, f64) = (0.0, 100.0);

/// Raw values of the stack form at the moment of submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub name: String,
    pub description: String,
    pub bet_price: String,
    pub winning_probability: String,
    pub fee_percentage: String,
    pub enabled: bool,
}

impl FormSnapshot {
    /// Build the payload, rejecting missing, malformed or out-of-range values.
    ///
    /// Fields are checked in form order, so the first offending field is reported.
    pub fn to_payload(&self) -> Result<StackPayload, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Missing(StackField::Name));
        }

        let bet_price = parse_integer(StackField::BetPrice, &self.bet_price)?;
        check_bet_price(bet_price)?;

        let winning_probability =
            parse_number(StackField::WinningProbability, &self.winning_probability)?;
        check_range(
            StackField::WinningProbability,
            winning_probability,
            PROBABILITY_RANGE,
        )?;

        let fee_percentage = parse_number(StackField::FeePercentage, &self.fee_percentage)?;
        check_range(StackField::FeePercentage, fee_percentage, FEE_RANGE)?;

        Ok(StackPayload {
            name: name.to_string(),
            description: self.description.clone(),
            bet_price,
            winning_probability,
            fee_percentage,
            enabled: self.enabled,
        })
    }

    pub fn value(&self, field: StackField) -> &str {
        match field {
            StackField::Name => &self.name,
            StackField::Description => &self.description,
            StackField::BetPrice => &self.bet_price,
            StackField::WinningProbability => &self.winning_probability,
            StackField::FeePercentage => &self.fee_percentage,
            StackField::Enabled => "",
        }
    }
}

impl From<&StackPayload> for FormSnapshot {
    fn from(payload: &StackPayload) -> Self {
        Self {
            name: payload.name.clone(),
            description: payload.description.clone(),
            bet_price: payload.bet_price.to_string(),
            winning_probability: payload.winning_probability.to_string(),
            fee_percentage: payload.fee_percentage.to_string(),
            enabled: payload.enabled,
        }
    }
}

fn parse_integer(field: StackField, raw: &str) -> Result<i64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    raw.parse().map_err(|_| ValidationError::NotAnInteger {
        field,
        value: raw.to_string(),
    })
}

fn parse_number(field: StackField, raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    raw.parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: raw.to_string(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn check_bet_price(bet_price: i64) -> Result<(), ValidationError> {
    if bet_price < MIN_BET_PRICE {
        return Err(ValidationError::OutOfRange {
            field: StackField::BetPrice,
            value: bet_price as f64,
            min: MIN_BET_PRICE as f64,
            max: i64::MAX as f64,
        });
    }
    Ok(())
}

fn check_range(field: StackField, value: f64, (min, max): (f64, f64)) -> Result<(), ValidationError> {
    // NaN is rejected here too
    if !(value >= min && value <= max) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Check a typed payload against the same rules the form applies.
pub fn validate(payload: &StackPayload) -> Result<(), ValidationError> {
    if payload.name.trim().is_empty() {
        return Err(ValidationError::Missing(StackField::Name));
    }
    check_bet_price(payload.bet_price)?;
    check_range(
        StackField::WinningProbability,
        payload.winning_probability,
        PROBABILITY_RANGE,
    )?;
    check_range(StackField::FeePercentage, payload.fee_percentage, FEE_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold_stack() -> FormSnapshot {
        FormSnapshot {
            name: "Gold Stack".to_string(),
            description: String::new(),
            bet_price: "1000".to_string(),
            winning_probability: "0.45".to_string(),
            fee_percentage: "2.5".to_string(),
            enabled: false,
        }
    }

    #[test]
    fn test_valid_snapshot() {
        let payload = gold_stack().to_payload().unwrap();
        assert_eq!(
            payload,
            StackPayload {
                name: "Gold Stack".to_string(),
                description: String::new(),
                bet_price: 1000,
                winning_probability: 0.45,
                fee_percentage: 2.5,
                enabled: false,
            }
        );
    }

    #[test]
    fn test_name_is_trimmed_and_required() {
        let mut snapshot = gold_stack();
        snapshot.name = "   ".to_string();
        assert_eq!(
            snapshot.to_payload(),
            Err(ValidationError::Missing(StackField::Name))
        );

        snapshot.name = "  Gold  ".to_string();
        assert_eq!(snapshot.to_payload().unwrap().name, "Gold");
    }

    #[test]
    fn test_description_is_passed_through() {
        let mut snapshot = gold_stack();
        snapshot.description = "  weekly pot\n".to_string();
        assert_eq!(snapshot.to_payload().unwrap().description, "  weekly pot\n");
    }

    #[test]
    fn test_bet_price_must_be_integer() {
        let mut snapshot = gold_stack();
        snapshot.bet_price = "12.5".to_string();
        assert_eq!(
            snapshot.to_payload(),
            Err(ValidationError::NotAnInteger {
                field: StackField::BetPrice,
                value: "12.5".to_string(),
            })
        );

        snapshot.bet_price = "abc".to_string();
        assert!(matches!(
            snapshot.to_payload(),
            Err(ValidationError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_bet_price_must_be_positive() {
        let mut snapshot = gold_stack();
        snapshot.bet_price = "0".to_string();
        let err = snapshot.to_payload().unwrap_err();
        assert_eq!(err.field(), StackField::BetPrice);
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_missing_numeric_fields() {
        let mut snapshot = gold_stack();
        snapshot.bet_price.clear();
        assert_eq!(
            snapshot.to_payload(),
            Err(ValidationError::Missing(StackField::BetPrice))
        );

        let mut snapshot = gold_stack();
        snapshot.fee_percentage = " ".to_string();
        assert_eq!(
            snapshot.to_payload(),
            Err(ValidationError::Missing(StackField::FeePercentage))
        );
    }

    #[test]
    fn test_probability_range() {
        let mut snapshot = gold_stack();
        snapshot.winning_probability = "1.5".to_string();
        let err = snapshot.to_payload().unwrap_err();
        assert_eq!(err.field(), StackField::WinningProbability);

        snapshot.winning_probability = "NaN".to_string();
        assert!(matches!(
            snapshot.to_payload(),
            Err(ValidationError::OutOfRange { .. })
        ));

        snapshot.winning_probability = "1".to_string();
        assert!(snapshot.to_payload().is_ok());
    }

    #[test]
    fn test_fee_range() {
        let mut snapshot = gold_stack();
        snapshot.fee_percentage = "-1".to_string();
        assert_eq!(
            snapshot.to_payload().unwrap_err().field(),
            StackField::FeePercentage
        );

        snapshot.fee_percentage = "100".to_string();
        assert!(snapshot.to_payload().is_ok());
    }

    #[test]
    fn test_snapshot_from_payload_roundtrips_values() {
        let payload = gold_stack().to_payload().unwrap();
        let snapshot = FormSnapshot::from(&payload);
        assert_eq!(snapshot.bet_price, "1000");
        assert_eq!(snapshot.winning_probability, "0.45");
        assert_eq!(snapshot.to_payload().unwrap(), payload);
    }

    #[test]
    fn test_error_message_names_field() {
        let err = ValidationError::Missing(StackField::BetPrice);
        assert_eq!(err.to_string(), "Bet Price (sats) is required");
    }

    #[test]
    fn test_validate_typed_payload() {
        let mut payload = gold_stack().to_payload().unwrap();
        assert!(validate(&payload).is_ok());

        payload.fee_percentage = 150.0;
        assert_eq!(validate(&payload).unwrap_err().field(), StackField::FeePercentage);

        payload.bet_price = 0;
        assert_eq!(validate(&payload).unwrap_err().field(), StackField::BetPrice);
    }
}
