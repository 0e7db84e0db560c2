//! Admin service.
//!
//! Catalog, user and order management. Every operation first checks that the
//! signed-in user's profile carries the admin role.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use petshop::status::OrderStatus;
use serde_json::json;
use tracing::{Span, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        admin::errors::AdminServiceError,
        catalog::{
            models::{CatalogItem, CatalogItemUpdate, ItemId, NewCatalogItem, fields::IMAGE_REF},
            repository::CatalogRepository,
        },
        orders::{
            OrdersService,
            models::{Order, OrderId},
        },
        profiles::{
            models::{Role, UserProfile, fields as profile_fields},
            service::load_profile,
        },
        stock::StockGate,
    },
    identity::{IdentityProvider, OwnerId},
    objects::ObjectStore,
    store::{Collection, Direction, Document, DocumentStore, Query, StoreError, fields},
};

#[derive(Clone)]
pub struct RemoteAdminService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    stock: Arc<dyn StockGate>,
    orders: Arc<dyn OrdersService>,
    objects: Arc<dyn ObjectStore>,
    catalog: CatalogRepository,
}

impl RemoteAdminService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        stock: Arc<dyn StockGate>,
        orders: Arc<dyn OrdersService>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            catalog: CatalogRepository::new(Arc::clone(&store)),
            store,
            identity,
            stock,
            orders,
            objects,
        }
    }

    async fn require_admin(&self) -> Result<OwnerId, AdminServiceError> {
        let owner = self
            .identity
            .current_owner()
            .ok_or(AdminServiceError::NotLoggedIn)?;

        let is_admin = load_profile(self.store.as_ref(), &owner)
            .await?
            .is_some_and(|profile| profile.is_admin());

        if !is_admin {
            warn!(owner_id = %owner, "admin operation refused");

            return Err(AdminServiceError::NotAuthorized);
        }

        Ok(owner)
    }

    async fn load_item(&self, item: &ItemId) -> Result<CatalogItem, AdminServiceError> {
        self.catalog
            .get(item)
            .await?
            .ok_or(AdminServiceError::ItemMissing)
    }
}

fn validate_new_item(item: &NewCatalogItem) -> Result<(), AdminServiceError> {
    if item.id.as_str().trim().is_empty() {
        return Err(AdminServiceError::InvalidItem("id is required".to_string()));
    }

    // ids become key segments
    if item.id.as_str().contains(['_', '/']) {
        return Err(AdminServiceError::InvalidItem(format!(
            "id {} may not contain '_' or '/'",
            item.id
        )));
    }

    if item.name.trim().is_empty() {
        return Err(AdminServiceError::InvalidItem("name is required".to_string()));
    }

    Ok(())
}

#[async_trait]
impl AdminService for RemoteAdminService {
    #[tracing::instrument(
        name = "admin.service.create_item",
        skip(self, item),
        fields(item_id = %item.id),
        err
    )]
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, AdminServiceError> {
        self.require_admin().await?;
        validate_new_item(&item)?;

        if self.catalog.get(&item.id).await?.is_some() {
            return Err(AdminServiceError::ItemExists(item.id));
        }

        let item = CatalogItem::from(item);

        self.catalog.save(&item).await?;

        info!(name = %item.name, price = item.price, "created catalog item");

        Ok(item)
    }

    #[tracing::instrument(name = "admin.service.update_item", skip(self, item, update), fields(item_id = %item), err)]
    async fn update_item(
        &self,
        item: &ItemId,
        update: CatalogItemUpdate,
    ) -> Result<CatalogItem, AdminServiceError> {
        self.require_admin().await?;

        if update.is_empty() {
            return Err(AdminServiceError::EmptyUpdate);
        }

        match self.catalog.patch(item, update.into_fields()).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(AdminServiceError::ItemMissing),
            Err(error) => return Err(error.into()),
        }

        self.load_item(item).await
    }

    #[tracing::instrument(name = "admin.service.delete_item", skip(self, item), fields(item_id = %item), err)]
    async fn delete_item(&self, item: &ItemId) -> Result<(), AdminServiceError> {
        self.require_admin().await?;

        if !self.catalog.delete(item).await? {
            return Err(AdminServiceError::ItemMissing);
        }

        info!("deleted catalog item");

        Ok(())
    }

    async fn restock(&self, item: &ItemId, quantity: u32) -> Result<u32, AdminServiceError> {
        self.require_admin().await?;

        Ok(self.stock.restock(item, quantity).await?)
    }

    #[tracing::instrument(
        name = "admin.service.upload_image",
        skip(self, item, bytes, content_type),
        fields(item_id = %item, size = bytes.len(), image_ref = tracing::field::Empty),
        err
    )]
    async fn upload_image(
        &self,
        item: &ItemId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<CatalogItem, AdminServiceError> {
        self.require_admin().await?;
        self.load_item(item).await?;

        let path = format!("products/{item}-{}", Uuid::now_v7());
        let url = self.objects.put(&path, bytes, content_type).await?;

        Span::current().record("image_ref", url.as_str());

        match self
            .catalog
            .patch(item, fields([(IMAGE_REF, json!(url))]))
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(AdminServiceError::ItemMissing),
            Err(error) => return Err(error.into()),
        }

        self.load_item(item).await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AdminServiceError> {
        self.require_admin().await?;

        let documents = self
            .store
            .query(
                Query::new(Collection::Users)
                    .order_by(profile_fields::DISPLAY_NAME, Direction::Ascending),
            )
            .await?;

        Ok(documents
            .iter()
            .map(Document::decode)
            .collect::<Result<Vec<UserProfile>, _>>()?)
    }

    #[tracing::instrument(name = "admin.service.set_role", skip(self, user), fields(user_id = %user), err)]
    async fn set_role(&self, user: &OwnerId, role: Role) -> Result<UserProfile, AdminServiceError> {
        self.require_admin().await?;

        match self
            .store
            .update(
                Collection::Users,
                user.as_str(),
                fields([(profile_fields::ROLE, json!(role))]),
            )
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(AdminServiceError::UserNotFound),
            Err(error) => return Err(error.into()),
        }

        info!(role = role.as_str(), "changed user role");

        load_profile(self.store.as_ref(), user)
            .await?
            .ok_or(AdminServiceError::UserNotFound)
    }

    #[tracing::instrument(name = "admin.service.delete_user", skip(self, user), fields(user_id = %user), err)]
    async fn delete_user(&self, user: &OwnerId) -> Result<(), AdminServiceError> {
        self.require_admin().await?;

        if !self.store.delete(Collection::Users, user.as_str()).await? {
            return Err(AdminServiceError::UserNotFound);
        }

        info!("deleted user");

        Ok(())
    }

    async fn list_all_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AdminServiceError> {
        self.require_admin().await?;

        Ok(self.orders.list_all_orders(status).await?)
    }

    async fn update_order_status(
        &self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminServiceError> {
        self.require_admin().await?;

        Ok(self.orders.update_status(order, status).await?)
    }
}

#[automock]
#[async_trait]
pub trait AdminService: Send + Sync {
    /// Add a new item to the catalog.
    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, AdminServiceError>;

    /// Edit descriptive fields of an item.
    async fn update_item(
        &self,
        item: &ItemId,
        update: CatalogItemUpdate,
    ) -> Result<CatalogItem, AdminServiceError>;

    async fn delete_item(&self, item: &ItemId) -> Result<(), AdminServiceError>;

    /// Add delivered units to an item. Returns the new stock.
    async fn restock(&self, item: &ItemId, quantity: u32) -> Result<u32, AdminServiceError>;

    /// Store an image and point the item's `imageRef` at it.
    async fn upload_image(
        &self,
        item: &ItemId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<CatalogItem, AdminServiceError>;

    /// Every profile, by display name.
    async fn list_users(&self) -> Result<Vec<UserProfile>, AdminServiceError>;

    async fn set_role(&self, user: &OwnerId, role: Role) -> Result<UserProfile, AdminServiceError>;

    async fn delete_user(&self, user: &OwnerId) -> Result<(), AdminServiceError>;

    /// Every order, newest first, optionally with one status.
    async fn list_all_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AdminServiceError>;

    /// Move an order along its lifecycle; cancelling returns stock.
    async fn update_order_status(
        &self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminServiceError>;
}

#[cfg(test)]
mod tests {
    use petshop::pricing::DiscountPercent;
    use testresult::TestResult;

    use crate::{
        domain::{catalog::CatalogService, orders::OrdersServiceError},
        test::{TestContext, helpers::seed_item},
    };

    use super::*;

    fn new_item(id: &str) -> NewCatalogItem {
        NewCatalogItem {
            id: ItemId::new(id),
            name: "Scratching post".to_string(),
            category: "cats".to_string(),
            price: 350_000,
            stock_count: 4,
            discount_percent: DiscountPercent::NONE,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn customers_are_refused() -> TestResult {
        let ctx = TestContext::new();

        assert!(matches!(
            ctx.app.admin.create_item(new_item("7")).await,
            Err(AdminServiceError::NotAuthorized)
        ));
        assert!(matches!(
            ctx.app.admin.list_users().await,
            Err(AdminServiceError::NotAuthorized)
        ));

        ctx.session.sign_out();

        assert!(matches!(
            ctx.app.admin.list_all_orders(None).await,
            Err(AdminServiceError::NotLoggedIn)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn admins_manage_the_catalog() -> TestResult {
        let ctx = TestContext::new();

        ctx.make_admin("u1").await?;

        let created = ctx.app.admin.create_item(new_item("7")).await?;

        assert_eq!(ctx.app.catalog.get_item(&created.id).await?, created);
        assert!(matches!(
            ctx.app.admin.create_item(new_item("7")).await,
            Err(AdminServiceError::ItemExists(_))
        ));

        let updated = ctx
            .app
            .admin
            .update_item(
                &created.id,
                CatalogItemUpdate {
                    price: Some(300_000),
                    ..CatalogItemUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.price, 300_000);
        assert_eq!(updated.stock_count, 4);
        assert_eq!(ctx.app.admin.restock(&created.id, 6).await?, 10);

        ctx.app.admin.delete_item(&created.id).await?;

        assert!(matches!(
            ctx.app.admin.delete_item(&created.id).await,
            Err(AdminServiceError::ItemMissing)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn item_ids_must_be_usable_as_key_segments() -> TestResult {
        let ctx = TestContext::new();

        ctx.make_admin("u1").await?;

        assert!(matches!(
            ctx.app.admin.create_item(new_item("cat_post")).await,
            Err(AdminServiceError::InvalidItem(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn uploaded_images_become_the_image_ref() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        ctx.make_admin("u1").await?;

        let updated = ctx
            .app
            .admin
            .upload_image(&item.id, b"\x89PNG".to_vec(), "image/png")
            .await?;

        let image_ref = updated.image_ref.ok_or("image ref not set")?;
        let path = image_ref
            .strip_prefix("memory://objects/")
            .ok_or("unexpected url")?;

        assert!(path.starts_with("products/42-"));
        assert_eq!(
            ctx.objects.object(path).await,
            Some((b"\x89PNG".to_vec(), "image/png".to_string()))
        );

        Ok(())
    }

    #[tokio::test]
    async fn roles_can_be_granted_and_users_removed() -> TestResult {
        let ctx = TestContext::new();

        ctx.make_admin("u1").await?;
        ctx.make_customer("u2").await?;

        let promoted = ctx.app.admin.set_role(&OwnerId::new("u2"), Role::Admin).await?;

        assert!(promoted.is_admin());
        assert_eq!(ctx.app.admin.list_users().await?.len(), 2);

        ctx.app.admin.delete_user(&OwnerId::new("u2")).await?;

        assert!(matches!(
            ctx.app.admin.set_role(&OwnerId::new("u2"), Role::Customer).await,
            Err(AdminServiceError::UserNotFound)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_orders_return_their_stock() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        ctx.make_admin("u1").await?;

        let order = ctx.app.orders.confirm_direct(&item, 3, "COD").await?;

        ctx.app
            .admin
            .update_order_status(&order.order_id, OrderStatus::Cancelled)
            .await?;

        assert_eq!(ctx.app.stock.check_stock(&item.id).await?, 5);
        assert!(matches!(
            ctx.app
                .admin
                .update_order_status(&order.order_id, OrderStatus::Shipping)
                .await,
            Err(AdminServiceError::Orders(OrdersServiceError::InvalidTransition { .. }))
        ));

        Ok(())
    }
}
