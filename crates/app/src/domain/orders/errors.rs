//! Orders service errors.

use petshop::{payment::MissingPaymentMethod, pricing::PricingError, status::OrderStatus};
use thiserror::Error;

use crate::{domain::stock::StockError, store::StoreError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("sign in to place orders")]
    NotLoggedIn,

    #[error("choose a payment method")]
    InvalidPaymentMethod(#[from] MissingPaymentMethod),

    #[error("cart is empty")]
    EmptyCart,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("item not found")]
    ItemMissing,

    #[error("item is out of stock")]
    OutOfStock,

    #[error("only {available} left in stock, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("order not found")]
    OrderNotFound,

    #[error("cart line not found")]
    LineNotFound,

    #[error("too many orders at once, try again")]
    Contended,

    #[error("cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid order total")]
    Pricing(#[from] PricingError),

    /// Cart checkout stopped at a failing line. Earlier lines stay ordered.
    #[error("{source}")]
    Halted {
        created: usize,
        source: Box<OrdersServiceError>,
    },

    #[error("orders unavailable")]
    Remote(#[source] StoreError),
}

impl OrdersServiceError {
    /// Orders that were persisted before the operation failed.
    #[must_use]
    pub fn created(&self) -> usize {
        match self {
            Self::Halted { created, .. } => *created,
            _ => 0,
        }
    }
}

impl From<StoreError> for OrdersServiceError {
    fn from(error: StoreError) -> Self {
        Self::Remote(error)
    }
}

impl From<StockError> for OrdersServiceError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::ItemMissing => Self::ItemMissing,
            StockError::OutOfStock => Self::OutOfStock,
            StockError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            StockError::InvalidQuantity => Self::InvalidQuantity,
            StockError::Contended => Self::Remote(StoreError::Unavailable(error.to_string())),
            StockError::Remote(source) => Self::Remote(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halted_checkout_reads_as_the_failing_line() {
        let error = OrdersServiceError::Halted {
            created: 1,
            source: Box::new(OrdersServiceError::OutOfStock),
        };

        assert_eq!(error.to_string(), "item is out of stock");
        assert_eq!(error.created(), 1);
    }
}
