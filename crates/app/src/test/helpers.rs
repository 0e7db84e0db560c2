//! Test Helpers

use petshop::pricing::DiscountPercent;

use crate::{
    domain::catalog::models::{CatalogItem, ItemId},
    store::{Collection, DocumentStore, StoreError, encode},
    test::TestContext,
};

/// Write a catalog item straight into the store, with no discount.
pub(crate) async fn seed_item(
    ctx: &TestContext,
    id: &str,
    name: &str,
    price: u64,
    stock_count: u32,
) -> Result<CatalogItem, StoreError> {
    let item = CatalogItem {
        id: ItemId::new(id),
        name: name.to_string(),
        category: "dogs".to_string(),
        price,
        stock_count,
        sold_count: 0,
        rating: 0,
        discount_percent: DiscountPercent::NONE,
        description: String::new(),
        image_ref: None,
    };

    ctx.store
        .set(Collection::Products, id, encode(&item)?)
        .await?;

    Ok(item)
}
