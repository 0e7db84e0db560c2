//! Catalog Models

use petshop::pricing::{self, DiscountPercent, PricingError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::ids::TypedId;

/// Catalog item identifier, e.g. `"42"`.
pub type ItemId = TypedId<CatalogItem>;

/// Document field names shared by services that patch catalog items.
pub(crate) mod fields {
    pub(crate) const CATEGORY: &str = "category";
    pub(crate) const PRICE: &str = "price";
    pub(crate) const STOCK_COUNT: &str = "stockCount";
    pub(crate) const SOLD_COUNT: &str = "soldCount";
    pub(crate) const RATING: &str = "rating";
    pub(crate) const IMAGE_REF: &str = "imageRef";
}

/// Catalog item as stored under `products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,

    #[serde(default)]
    pub category: String,

    /// Whole dong.
    pub price: u64,

    pub stock_count: u32,

    #[serde(default)]
    pub sold_count: u64,

    /// Integer average of all review ratings; `0` before the first review.
    #[serde(default)]
    pub rating: u8,

    #[serde(default)]
    pub discount_percent: DiscountPercent,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CatalogItem {
    /// Freeze the fields a cart line or order keeps.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            discount_percent: self.discount_percent,
            image_ref: self.image_ref.clone(),
        }
    }

    /// Price after the item's discount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] for prices too large to discount.
    pub fn unit_price(&self) -> Result<u64, PricingError> {
        pricing::discounted_unit_price(self.price, self.discount_percent)
    }
}

/// Denormalized copy of a catalog item taken when it enters a cart or order.
///
/// Later catalog edits never reach an existing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub price: u64,

    #[serde(default)]
    pub discount_percent: DiscountPercent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl ItemSnapshot {
    /// Discounted total for `quantity` units.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit.
    pub fn line_total(&self, quantity: u32) -> Result<u64, PricingError> {
        pricing::line_total(self.price, self.discount_percent, quantity)
    }
}

/// New catalog item, created by an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub price: u64,
    pub stock_count: u32,
    pub discount_percent: DiscountPercent,
    pub description: String,
}

impl From<NewCatalogItem> for CatalogItem {
    fn from(item: NewCatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            price: item.price,
            stock_count: item.stock_count,
            sold_count: 0,
            rating: 0,
            discount_percent: item.discount_percent,
            description: item.description,
            image_ref: None,
        }
    }
}

/// Partial edit of the descriptive fields of a catalog item.
///
/// Stock, sales and rating are maintained by their own workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<u64>,
    pub discount_percent: Option<DiscountPercent>,
    pub description: Option<String>,
}

impl CatalogItemUpdate {
    /// Changed fields as a document patch.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        let mut patch = Map::new();

        if let Some(name) = self.name {
            patch.insert("name".to_string(), json!(name));
        }

        if let Some(category) = self.category {
            patch.insert(fields::CATEGORY.to_string(), json!(category));
        }

        if let Some(price) = self.price {
            patch.insert(fields::PRICE.to_string(), json!(price));
        }

        if let Some(discount) = self.discount_percent {
            patch.insert("discountPercent".to_string(), json!(discount.value()));
        }

        if let Some(description) = self.description {
            patch.insert("description".to_string(), json!(description));
        }

        patch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn items_use_camel_case_documents() -> TestResult {
        let item: CatalogItem = serde_json::from_value(json!({
            "id": "42",
            "name": "Kibble",
            "price": 100_000,
            "stockCount": 3,
            "discountPercent": 20
        }))?;

        assert_eq!(item.sold_count, 0);
        assert_eq!(item.unit_price()?, 80_000);

        let body = serde_json::to_value(&item)?;

        assert_eq!(body["stockCount"], json!(3));
        assert!(body.get("imageRef").is_none());

        Ok(())
    }

    #[test]
    fn updates_only_carry_changed_fields() {
        let update = CatalogItemUpdate {
            price: Some(120_000),
            ..CatalogItemUpdate::default()
        };

        assert!(!update.is_empty());
        assert_eq!(
            Value::Object(update.into_fields()),
            json!({ "price": 120_000 })
        );
    }
}
