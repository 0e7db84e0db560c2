//! Cart Models

use petshop::{keys, pricing::PricingError};
use serde::{Deserialize, Serialize};

use crate::{
    domain::catalog::models::{ItemId, ItemSnapshot},
    identity::OwnerId,
};

pub(crate) mod fields {
    pub(crate) const OWNER_ID: &str = "ownerId";
    pub(crate) const QUANTITY: &str = "quantity";
    pub(crate) const SEQUENCE_INDEX: &str = "sequenceIndex";
}

/// One row of a shopper's cart, stored under `carts/{ownerId}_{sequenceIndex}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub quantity: u32,

    /// Item as it was when first added.
    pub item: ItemSnapshot,

    pub sequence_index: u64,
}

impl CartLine {
    /// Document key of this line.
    #[must_use]
    pub fn key(&self) -> String {
        keys::cart_line_key(self.owner_id.as_str(), self.sequence_index)
    }

    /// Discounted total of the line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit.
    pub fn line_total(&self) -> Result<u64, PricingError> {
        self.item.line_total(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use petshop::pricing::DiscountPercent;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn lines_are_keyed_by_owner_and_sequence() -> TestResult {
        let line = CartLine {
            owner_id: OwnerId::new("u1"),
            item_id: ItemId::new("42"),
            quantity: 2,
            item: ItemSnapshot {
                id: ItemId::new("42"),
                name: "Kibble".to_string(),
                price: 100_000,
                discount_percent: DiscountPercent::new(20)?,
                image_ref: None,
            },
            sequence_index: 3,
        };

        assert_eq!(line.key(), "u1_3");
        assert_eq!(line.line_total()?, 160_000);
        assert_eq!(serde_json::to_value(&line)?["sequenceIndex"], json!(3));

        Ok(())
    }
}
