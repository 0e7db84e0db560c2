//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use petshop::keys;
use tracing::info;

use crate::{
    domain::{
        carts::{errors::CartsServiceError, models::CartLine, repository::CartLinesRepository},
        catalog::{models::ItemId, repository::CatalogRepository},
        stock::StockGate,
    },
    identity::{IdentityProvider, OwnerId},
    store::{DocumentStore, Snapshots},
};

#[derive(Clone)]
pub struct RemoteCartsService {
    identity: Arc<dyn IdentityProvider>,
    stock: Arc<dyn StockGate>,
    catalog: CatalogRepository,
    lines: CartLinesRepository,
}

impl RemoteCartsService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        stock: Arc<dyn StockGate>,
    ) -> Self {
        Self {
            identity,
            stock,
            catalog: CatalogRepository::new(Arc::clone(&store)),
            lines: CartLinesRepository::new(store),
        }
    }

    fn owner(&self) -> Result<OwnerId, CartsServiceError> {
        self.identity
            .current_owner()
            .ok_or(CartsServiceError::NotLoggedIn)
    }

    /// Lines belonging to another owner are reported as missing.
    fn check_owner(&self, line: &CartLine) -> Result<(), CartsServiceError> {
        if line.owner_id != self.owner()? {
            return Err(CartsServiceError::LineNotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl CartsService for RemoteCartsService {
    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(item_id = %item, owner_id = tracing::field::Empty),
        err
    )]
    async fn add_item(&self, item: &ItemId) -> Result<CartLine, CartsServiceError> {
        let owner = self.owner()?;

        tracing::Span::current().record("owner_id", tracing::field::display(&owner));

        let catalog_item = self
            .catalog
            .get(item)
            .await?
            .ok_or(CartsServiceError::ItemMissing)?;

        if catalog_item.stock_count == 0 {
            return Err(CartsServiceError::OutOfStock);
        }

        let lines = self.lines.list(&owner).await?;

        if let Some(existing) = lines.iter().find(|line| line.item_id == *item) {
            let quantity = existing
                .quantity
                .checked_add(1)
                .ok_or(CartsServiceError::InvalidQuantity)?;

            if catalog_item.stock_count < quantity {
                return Err(CartsServiceError::InsufficientStock {
                    available: catalog_item.stock_count,
                    requested: quantity,
                });
            }

            self.lines.set_quantity(existing, quantity).await?;

            info!(line = %existing.key(), quantity, "merged into cart line");

            return Ok(CartLine {
                quantity,
                ..existing.clone()
            });
        }

        let line = CartLine {
            owner_id: owner,
            item_id: item.clone(),
            quantity: 1,
            item: catalog_item.snapshot(),
            sequence_index: keys::next_sequence(lines.iter().map(|line| line.sequence_index)),
        };

        self.lines.create(&line).await?;

        info!(line = %line.key(), "created cart line");

        Ok(line)
    }

    #[tracing::instrument(
        name = "carts.service.set_quantity",
        skip(self, line),
        fields(line = %line.key()),
        err
    )]
    async fn set_quantity(
        &self,
        line: &CartLine,
        quantity: i64,
    ) -> Result<Option<CartLine>, CartsServiceError> {
        self.check_owner(line)?;

        if quantity <= 0 {
            self.remove_item(line).await?;

            return Ok(None);
        }

        let Ok(quantity) = u32::try_from(quantity) else {
            return Err(CartsServiceError::InvalidQuantity);
        };

        let available = self.stock.check_stock(&line.item_id).await?;

        if available < quantity {
            return Err(CartsServiceError::InsufficientStock {
                available,
                requested: quantity,
            });
        }

        self.lines.set_quantity(line, quantity).await?;

        Ok(Some(CartLine {
            quantity,
            ..line.clone()
        }))
    }

    async fn increase(&self, line: &CartLine) -> Result<Option<CartLine>, CartsServiceError> {
        self.set_quantity(line, i64::from(line.quantity) + 1).await
    }

    async fn decrease(&self, line: &CartLine) -> Result<Option<CartLine>, CartsServiceError> {
        self.set_quantity(line, i64::from(line.quantity) - 1).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self, line),
        fields(line = %line.key()),
        err
    )]
    async fn remove_item(&self, line: &CartLine) -> Result<(), CartsServiceError> {
        self.check_owner(line)?;

        if !self.lines.delete(line).await? {
            return Err(CartsServiceError::LineNotFound);
        }

        info!("removed cart line");

        Ok(())
    }

    async fn list_lines(&self) -> Result<Vec<CartLine>, CartsServiceError> {
        let owner = self.owner()?;

        Ok(self.lines.list(&owner).await?)
    }

    async fn subscribe(&self) -> Result<Snapshots<CartLine>, CartsServiceError> {
        let owner = self.owner()?;

        Ok(self.lines.subscribe(&owner).await?)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add one unit of an item, merging into the existing line for that item.
    async fn add_item(&self, item: &ItemId) -> Result<CartLine, CartsServiceError>;

    /// Change a line's quantity; zero or less removes the line and returns `None`.
    async fn set_quantity(
        &self,
        line: &CartLine,
        quantity: i64,
    ) -> Result<Option<CartLine>, CartsServiceError>;

    /// One more unit.
    async fn increase(&self, line: &CartLine) -> Result<Option<CartLine>, CartsServiceError>;

    /// One unit fewer; removes the line at zero.
    async fn decrease(&self, line: &CartLine) -> Result<Option<CartLine>, CartsServiceError>;

    /// Delete a line.
    async fn remove_item(&self, line: &CartLine) -> Result<(), CartsServiceError>;

    /// The current owner's lines, in the order they were added.
    async fn list_lines(&self) -> Result<Vec<CartLine>, CartsServiceError>;

    /// Live view of the current owner's lines.
    async fn subscribe(&self) -> Result<Snapshots<CartLine>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::catalog::CatalogService,
        test::{TestContext, helpers::seed_item},
    };

    use super::*;

    #[tokio::test]
    async fn add_item_requires_a_signed_in_owner() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        ctx.session.sign_out();

        assert!(matches!(
            ctx.app.carts.add_item(&item.id).await,
            Err(CartsServiceError::NotLoggedIn)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_missing_and_sold_out_items() -> TestResult {
        let ctx = TestContext::new();
        let sold_out = seed_item(&ctx, "7", "Catnip", 20_000, 0).await?;

        assert!(matches!(
            ctx.app.carts.add_item(&ItemId::new("404")).await,
            Err(CartsServiceError::ItemMissing)
        ));
        assert!(matches!(
            ctx.app.carts.add_item(&sold_out.id).await,
            Err(CartsServiceError::OutOfStock)
        ));
        assert!(ctx.app.carts.list_lines().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn new_lines_take_the_next_sequence_index() -> TestResult {
        let ctx = TestContext::new();
        let kibble = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;
        let catnip = seed_item(&ctx, "43", "Catnip", 20_000, 5).await?;

        let first = ctx.app.carts.add_item(&kibble.id).await?;
        let second = ctx.app.carts.add_item(&catnip.id).await?;

        assert_eq!(first.sequence_index, 1);
        assert_eq!(second.sequence_index, 2);
        assert_eq!(second.key(), "u1_2");

        Ok(())
    }

    #[tokio::test]
    async fn merging_past_available_stock_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 1).await?;

        ctx.app.carts.add_item(&item.id).await?;

        assert!(matches!(
            ctx.app.carts.add_item(&item.id).await,
            Err(CartsServiceError::InsufficientStock {
                available: 1,
                requested: 2
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn snapshots_are_frozen_at_add_time() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        ctx.app.carts.add_item(&item.id).await?;
        ctx.patch_item("42", "price", 999_000).await?;
        ctx.app.carts.add_item(&item.id).await?;

        let lines = ctx.app.carts.list_lines().await?;
        let line = lines.first().ok_or("missing line")?;

        assert_eq!(line.item.price, 100_000);
        assert_eq!(ctx.app.catalog.get_item(&item.id).await?.price, 999_000);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_checks_stock_and_removes_at_zero() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 3).await?;

        let line = ctx.app.carts.add_item(&item.id).await?;

        assert!(matches!(
            ctx.app.carts.set_quantity(&line, 4).await,
            Err(CartsServiceError::InsufficientStock {
                available: 3,
                requested: 4
            })
        ));

        let updated = ctx.app.carts.set_quantity(&line, 3).await?;

        assert_eq!(updated.map(|line| line.quantity), Some(3));
        assert_eq!(ctx.app.carts.set_quantity(&line, 0).await?, None);
        assert!(ctx.app.carts.list_lines().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn removing_a_vanished_line_reports_it() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 3).await?;

        let line = ctx.app.carts.add_item(&item.id).await?;

        ctx.app.carts.remove_item(&line).await?;

        assert!(matches!(
            ctx.app.carts.remove_item(&line).await,
            Err(CartsServiceError::LineNotFound)
        ));
        assert!(matches!(
            ctx.app.carts.set_quantity(&line, 2).await,
            Err(CartsServiceError::LineNotFound)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn increase_and_decrease_step_by_one() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 3).await?;

        let line = ctx.app.carts.add_item(&item.id).await?;
        let line = ctx.app.carts.increase(&line).await?.ok_or("line removed")?;

        assert_eq!(line.quantity, 2);

        let line = ctx.app.carts.decrease(&line).await?.ok_or("line removed")?;

        assert_eq!(line.quantity, 1);
        assert_eq!(ctx.app.carts.decrease(&line).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn lines_of_other_owners_are_out_of_reach() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        let line = ctx.app.carts.add_item(&item.id).await?;

        ctx.session.sign_in("u2");

        assert!(matches!(
            ctx.app.carts.set_quantity(&line, 3).await,
            Err(CartsServiceError::LineNotFound)
        ));
        assert!(matches!(
            ctx.app.carts.decrease(&line).await,
            Err(CartsServiceError::LineNotFound)
        ));
        assert!(matches!(
            ctx.app.carts.remove_item(&line).await,
            Err(CartsServiceError::LineNotFound)
        ));

        ctx.session.sign_in("u1");

        assert_eq!(ctx.app.carts.list_lines().await?, vec![line]);

        Ok(())
    }
}
