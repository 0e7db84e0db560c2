//! Cart and checkout workflow against the in-memory backends

use std::sync::Arc;

use petshop::pricing::DiscountPercent;
use petshop_app::{
    context::AppContext,
    domain::{
        carts::{CartsService, CartsServiceError},
        catalog::{
            CatalogService,
            models::{CatalogItem, ItemId},
        },
        orders::{OrdersService, OrdersServiceError},
        reviews::ReviewsService,
        stock::StockGate,
    },
    identity::SessionIdentity,
    objects::MemoryObjectStore,
    store::{Collection, DocumentStore, MemoryDocumentStore, encode},
};
use testresult::TestResult;

struct Shop {
    app: AppContext,
    store: MemoryDocumentStore,
}

impl Shop {
    fn open() -> Self {
        let store = MemoryDocumentStore::new();
        let session = Arc::new(SessionIdentity::new());

        session.sign_in("u1");

        Self {
            app: AppContext::new(
                Arc::new(store.clone()),
                Arc::new(MemoryObjectStore::new()),
                session,
            ),
            store,
        }
    }

    async fn stock(&self, id: &str, price: u64, discount: u8, stock_count: u32) -> TestResult<CatalogItem> {
        let item = CatalogItem {
            id: ItemId::new(id),
            name: format!("Item {id}"),
            category: "dogs".to_string(),
            price,
            stock_count,
            sold_count: 0,
            rating: 0,
            discount_percent: DiscountPercent::new(discount)?,
            description: String::new(),
            image_ref: None,
        };

        self.store
            .set(Collection::Products, id, encode(&item)?)
            .await?;

        Ok(item)
    }
}

#[tokio::test]
async fn sold_out_items_never_reach_the_cart() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 0, 0).await?;

    assert!(matches!(
        shop.app.carts.add_item(&item.id).await,
        Err(CartsServiceError::OutOfStock)
    ));
    assert!(shop.app.carts.list_lines().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn repeated_adds_merge_into_one_line() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 0, 10).await?;

    for _ in 0..3 {
        shop.app.carts.add_item(&item.id).await?;
    }

    let lines = shop.app.carts.list_lines().await?;

    assert_eq!(lines.len(), 1);
    assert_eq!(lines.first().map(|line| line.quantity), Some(3));

    Ok(())
}

#[tokio::test]
async fn non_positive_quantities_remove_the_line() -> TestResult {
    let shop = Shop::open();
    let kibble = shop.stock("42", 100_000, 0, 10).await?;
    let catnip = shop.stock("43", 20_000, 0, 10).await?;

    let first = shop.app.carts.add_item(&kibble.id).await?;
    let second = shop.app.carts.add_item(&catnip.id).await?;

    assert_eq!(shop.app.carts.set_quantity(&first, 0).await?, None);
    assert_eq!(shop.app.carts.set_quantity(&second, -3).await?, None);
    assert!(shop.app.carts.list_lines().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn direct_orders_charge_the_discounted_price() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 20, 5).await?;

    let order = shop.app.orders.confirm_direct(&item, 2, "COD").await?;

    assert_eq!(order.total_price, 160_000);
    assert_eq!(order.order_id.as_str(), "u1_42_1");

    Ok(())
}

#[tokio::test]
async fn checkout_halts_at_the_first_failing_line() -> TestResult {
    let shop = Shop::open();

    for id in ["42", "43", "44"] {
        let item = shop.stock(id, 50_000, 0, 5).await?;

        shop.app.carts.add_item(&item.id).await?;
    }

    shop.store.fail_writes(Collection::Orders, "u1_43_").await;

    let lines = shop.app.carts.list_lines().await?;
    let result = shop.app.orders.confirm_from_cart(&lines, "COD").await;

    let Err(error) = result else {
        return Err("checkout should have failed".into());
    };

    assert!(matches!(
        &error,
        OrdersServiceError::Halted { created: 1, source } if matches!(**source, OrdersServiceError::Remote(_))
    ));
    assert_eq!(error.to_string(), "orders unavailable");

    let orders = shop.app.orders.list_orders().await?;
    let remaining: Vec<String> = shop
        .app
        .carts
        .list_lines()
        .await?
        .iter()
        .map(|line| line.item_id.to_string())
        .collect();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().map(|order| order.item_id.as_str()), Some("42"));
    assert_eq!(remaining, ["43", "44"]);

    // the failed line's reservation is handed back and line 3 is never tried
    assert_eq!(shop.app.stock.check_stock(&ItemId::new("43")).await?, 5);
    assert_eq!(shop.app.stock.check_stock(&ItemId::new("44")).await?, 5);

    Ok(())
}

#[tokio::test]
async fn order_ids_count_up_per_owner_and_item() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 0, 5).await?;

    let first = shop.app.orders.confirm_direct(&item, 1, "COD").await?;
    let second = shop.app.orders.confirm_direct(&item, 1, "VNPay").await?;

    assert_eq!(first.order_id.as_str(), "u1_42_1");
    assert_eq!(second.order_id.as_str(), "u1_42_2");

    Ok(())
}

#[tokio::test]
async fn the_first_review_sets_the_rating() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 0, 5).await?;

    shop.app.reviews.submit_review(&item.id, 4, "Good").await?;

    assert_eq!(shop.app.catalog.get_item(&item.id).await?.rating, 4);

    Ok(())
}

#[tokio::test]
async fn cart_snapshots_keep_the_price_at_add_time() -> TestResult {
    let shop = Shop::open();
    let item = shop.stock("42", 100_000, 0, 5).await?;

    shop.app.carts.add_item(&item.id).await?;
    shop.stock("42", 150_000, 0, 5).await?;

    let lines = shop.app.carts.list_lines().await?;
    let orders = shop.app.orders.confirm_from_cart(&lines, "COD").await?;

    assert_eq!(orders.first().map(|order| order.total_price), Some(100_000));

    Ok(())
}
