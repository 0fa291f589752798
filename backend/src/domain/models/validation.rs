//! Input domains for profiles and consumptions.

use std::ops::RangeInclusive;

pub const AGE_RANGE: RangeInclusive<u32> = 18..=100;
pub const WEIGHT_RANGE_KG: RangeInclusive<u32> = 40..=200;
pub const AMOUNT_RANGE_GRAMS: RangeInclusive<f64> = 0.01..=10.0;
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

/// A profile or consumption field outside its documented domain
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("Name must be between 2 and 100 characters")]
    NameLength,
    #[error("Age must be between 18 and 100, got {0}")]
    AgeOutOfRange(u32),
    #[error("Weight must be between 40 and 200 kg, got {0}")]
    WeightOutOfRange(u32),
    #[error("Amount must be between 0.01 and 10 g, got {0}")]
    AmountOutOfRange(f64),
    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),
    #[error("Unknown consumption method: {0}")]
    UnknownMethod(String),
}

pub fn validate_name(name: &str) -> Result<(), InvalidInput> {
    let length = name.trim().chars().count();
    if length < NAME_MIN_CHARS || length > NAME_MAX_CHARS {
        return Err(InvalidInput::NameLength);
    }
    Ok(())
}

pub fn validate_age(age: u32) -> Result<(), InvalidInput> {
    if !AGE_RANGE.contains(&age) {
        return Err(InvalidInput::AgeOutOfRange(age));
    }
    Ok(())
}

pub fn validate_weight(weight: u32) -> Result<(), InvalidInput> {
    if !WEIGHT_RANGE_KG.contains(&weight) {
        return Err(InvalidInput::WeightOutOfRange(weight));
    }
    Ok(())
}

/// NaN and infinities are rejected along with out-of-range values
pub fn validate_amount(amount: f64) -> Result<(), InvalidInput> {
    if !amount.is_finite() || !AMOUNT_RANGE_GRAMS.contains(&amount) {
        return Err(InvalidInput::AmountOutOfRange(amount));
    }
    Ok(())
}

/// Parse a frequency coming from free-form input
pub fn parse_frequency(value: &str) -> Result<shared::Frequency, InvalidInput> {
    value
        .parse()
        .map_err(|_| InvalidInput::UnknownFrequency(value.to_string()))
}

/// Parse a consumption method coming from free-form input
pub fn parse_method(value: &str) -> Result<shared::ConsumptionMethod, InvalidInput> {
    value
        .parse()
        .map_err(|_| InvalidInput::UnknownMethod(value.to_string()))
}
