//! Payment methods

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The payment method was blank.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("a payment method is required")]
pub struct MissingPaymentMethod;

/// Payment method chosen at checkout, stored on the order verbatim.
///
/// No gateway round trip happens at checkout; the value only records what the
/// shopper picked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Cash on delivery.
    pub const COD: &'static str = "COD";

    /// VNPay online payment.
    pub const VNPAY: &'static str = "VNPay";

    /// Parse a payment method, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`MissingPaymentMethod`] when the value is empty after trimming.
    pub fn parse(value: &str) -> Result<Self, MissingPaymentMethod> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(MissingPaymentMethod);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Cash on delivery.
    #[must_use]
    pub fn cod() -> Self {
        Self(Self::COD.to_string())
    }

    /// Whether this is one of the methods the storefront offers out of the box.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.0 == Self::COD || self.0 == Self::VNPAY
    }

    /// The stored value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = MissingPaymentMethod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentMethod> for String {
    fn from(value: PaymentMethod) -> Self {
        value.0
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
