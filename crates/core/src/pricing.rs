//! Pricing

use std::fmt;

use rusty_money::{Money, iso};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while pricing a line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Discounts are whole percentages between 0 and 100.
    #[error("discount of {0}% is outside 0..=100")]
    DiscountOutOfRange(u8),

    /// The line total does not fit into the amount type.
    #[error("line total overflowed")]
    Overflow,
}

/// Whole-number discount percentage, 0 to 100 inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DiscountPercent(u8);

impl DiscountPercent {
    /// No discount.
    pub const NONE: Self = Self(0);

    /// Create a discount percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::DiscountOutOfRange`] when `value` exceeds 100.
    pub const fn new(value: u8) -> Result<Self, PricingError> {
        if value > 100 {
            return Err(PricingError::DiscountOutOfRange(value));
        }

        Ok(Self(value))
    }

    /// Percentage points.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DiscountPercent {
    type Error = PricingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for u8 {
    fn from(value: DiscountPercent) -> Self {
        value.0
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Unit price after discount: `price - price * discount / 100`, truncating.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when `price * discount` does not fit.
pub fn discounted_unit_price(price: u64, discount: DiscountPercent) -> Result<u64, PricingError> {
    let reduction = price
        .checked_mul(u64::from(discount.value()))
        .ok_or(PricingError::Overflow)?
        / 100;

    // reduction <= price because discount <= 100
    Ok(price - reduction)
}

/// Total for `quantity` units at the discounted unit price.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the total does not fit.
pub fn line_total(
    price: u64,
    discount: DiscountPercent,
    quantity: u32,
) -> Result<u64, PricingError> {
    discounted_unit_price(price, discount)?
        .checked_mul(u64::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// Sum a set of line totals.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum does not fit.
pub fn sum_totals<I>(totals: I) -> Result<u64, PricingError>
where
    I: IntoIterator<Item = u64>,
{
    totals
        .into_iter()
        .try_fold(0_u64, |acc, total| acc.checked_add(total))
        .ok_or(PricingError::Overflow)
}

/// Render an amount in the store currency (Vietnamese dong, no minor units).
#[must_use]
pub fn format_amount(amount: u64) -> String {
    match i64::try_from(amount) {
        Ok(minor) => Money::from_minor(minor, iso::VND).to_string(),
        Err(_) => format!("{amount} VND"),
    }
}
