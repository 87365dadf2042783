//! Turns raw user input into the canonical form that the ledger stores and matches on.

use crate::error::ValidationError;
use crate::model::Amount;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// The largest amount a single entry, or a merged total, may hold. Far enough below
/// `Decimal::MAX` that summing any realistic ledger cannot overflow.
pub const MAX_AMOUNT: u64 = 1_000_000_000_000;

/// True if `amount` is above `MAX_AMOUNT`.
pub fn exceeds_max(amount: Amount) -> bool {
    amount.value() > Decimal::from(MAX_AMOUNT)
}

/// A description and amount that have passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedInput {
    description: String,
    amount: Amount,
}

impl NormalizedInput {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub(crate) fn into_parts(self) -> (String, Amount) {
        (self.description, self.amount)
    }
}

/// Validates and canonicalizes a raw description and amount.
///
/// The description is trimmed, then its first character is upper-cased and the rest
/// lower-cased, so `"  cOFFEE beans"` becomes `"Coffee beans"`. The amount must parse as a
/// number that is not negative and not above `MAX_AMOUNT`; a leading `$` and thousands separators
/// are accepted.
pub fn normalize(
    raw_description: &str,
    raw_amount: &str,
) -> Result<NormalizedInput, ValidationError> {
    let description = raw_description.trim();
    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    let raw_amount = raw_amount.trim();
    let amount = Amount::from_str(raw_amount)
        .map_err(|_| ValidationError::InvalidAmount(raw_amount.to_string()))?;
    if amount.is_negative() {
        return Err(ValidationError::NegativeAmount(raw_amount.to_string()));
    }
    if exceeds_max(amount) {
        return Err(ValidationError::AmountTooLarge(raw_amount.to_string()));
    }

    Ok(NormalizedInput {
        description: capitalize(description),
        amount,
    })
}

/// Upper-cases the first character and lower-cases everything after it.
///
/// A first character whose upper-case form is more than one character (`ß` becomes `SS`) is kept
/// as it is, otherwise normalizing the result again would lower-case the expansion.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out = String::with_capacity(s.len());
    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => out.push(u),
        _ => out.push(first),
    }
    out.extend(chars.flat_map(char::to_lowercase));
    out
}
