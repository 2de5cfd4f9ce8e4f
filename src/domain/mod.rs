//! Domain types and DTOs
//!
//! Tenders, bids and the caller profiles that own them.

pub mod bids;
pub mod dashboard;
pub mod documents;
pub mod tenders;
pub mod users;

pub use bids::*;
pub use dashboard::*;
pub use documents::*;
pub use tenders::*;
pub use users::*;

use rust_decimal::Decimal;
use thiserror::Error;

/// Input that fails a domain rule (negative amount, missing title, ...)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A stored status or category string that matches no known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Decimal places kept for money amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Exclusive upper bound for money amounts, matching `NUMERIC(14, 2)`
pub fn amount_limit() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

/// Shared rule for bid amounts and tender budgets
pub(crate) fn validate_amount(label: &str, amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::new(format!("{label} cannot be negative")));
    }
    if amount >= amount_limit() {
        return Err(ValidationError::new(format!(
            "{label} must be less than {}",
            amount_limit()
        )));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ValidationError::new(format!(
            "{label} must have at most {AMOUNT_SCALE} decimal places"
        )));
    }
    Ok(())
}
