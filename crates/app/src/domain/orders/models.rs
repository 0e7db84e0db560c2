//! Order Models

use jiff::Timestamp;
use petshop::{payment::PaymentMethod, pricing::PricingError, status::OrderStatus};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        carts::models::CartLine,
        catalog::models::{CatalogItem, ItemId, ItemSnapshot},
    },
    ids::TypedId,
    identity::OwnerId,
};

/// Order identifier, `{ownerId}_{itemId}_{sequenceIndex}`.
pub type OrderId = TypedId<Order>;

pub(crate) mod fields {
    pub(crate) const OWNER_ID: &str = "ownerId";
    pub(crate) const ITEM_ID: &str = "itemId";
    pub(crate) const STATUS: &str = "status";
    pub(crate) const CREATED_AT: &str = "createdAt";
}

/// A persisted order. Immutable after creation apart from `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub item: ItemSnapshot,
    pub quantity: u32,

    /// Discounted total, fixed when the order was placed.
    pub total_price: u64,

    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub sequence_index: u64,

    #[serde(with = "jiff::fmt::serde::timestamp::millisecond::required")]
    pub created_at: Timestamp,
}

/// What checkout is about to commit. Lives only on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub item: ItemSnapshot,
    pub quantity: u32,
    pub total_price: u64,

    /// Key of the cart line this was staged from, for cart checkout.
    pub cart_line: Option<String>,
}

impl PendingOrder {
    /// Stage a direct purchase.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit.
    pub fn direct(item: &CatalogItem, quantity: u32) -> Result<Self, PricingError> {
        let item = item.snapshot();

        Ok(Self {
            total_price: item.line_total(quantity)?,
            item,
            quantity,
            cart_line: None,
        })
    }

    /// Stage a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit.
    pub fn from_line(line: &CartLine) -> Result<Self, PricingError> {
        Ok(Self {
            item: line.item.clone(),
            quantity: line.quantity,
            total_price: line.line_total()?,
            cart_line: Some(line.key()),
        })
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        OrderStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use petshop::pricing::DiscountPercent;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn created_at_is_stored_as_epoch_millis() -> TestResult {
        let order = Order {
            order_id: OrderId::new("u1_42_1"),
            owner_id: OwnerId::new("u1"),
            item_id: ItemId::new("42"),
            item: ItemSnapshot {
                id: ItemId::new("42"),
                name: "Kibble".to_string(),
                price: 100_000,
                discount_percent: DiscountPercent::new(20)?,
                image_ref: None,
            },
            quantity: 2,
            total_price: 160_000,
            payment_method: PaymentMethod::cod(),
            status: OrderStatus::Confirmed,
            sequence_index: 1,
            created_at: Timestamp::from_millisecond(1_700_000_000_000)?,
        };

        let body = serde_json::to_value(&order)?;

        assert_eq!(body["createdAt"], json!(1_700_000_000_000_i64));
        assert_eq!(body["status"], json!("confirmed"));
        assert_eq!(body["paymentMethod"], json!("COD"));
        assert_eq!(serde_json::from_value::<Order>(body)?, order);

        Ok(())
    }
}
