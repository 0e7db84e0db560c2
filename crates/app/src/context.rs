//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database,
    domain::{
        admin::{AdminService, RemoteAdminService},
        carts::{CartStore, CartsService, RemoteCartsService},
        catalog::{CatalogService, RemoteCatalogService},
        notifications::{NotificationsService, RemoteNotificationsService},
        orders::{CheckoutStore, OrdersService, RemoteOrdersService},
        profiles::{ProfilesService, RemoteProfilesService},
        reviews::{RemoteReviewsService, ReviewsService},
        stock::{RemoteStockGate, StockGate},
    },
    identity::IdentityProvider,
    objects::ObjectStore,
    store::{DocumentStore, PgDocumentStore},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub catalog: Arc<dyn CatalogService>,
    pub stock: Arc<dyn StockGate>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub reviews: Arc<dyn ReviewsService>,
    pub notifications: Arc<dyn NotificationsService>,
    pub profiles: Arc<dyn ProfilesService>,
    pub admin: Arc<dyn AdminService>,
}

impl AppContext {
    /// Wire every service over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let stock: Arc<dyn StockGate> = Arc::new(RemoteStockGate::new(Arc::clone(&store)));

        let notifications: Arc<dyn NotificationsService> = Arc::new(
            RemoteNotificationsService::new(Arc::clone(&store), Arc::clone(&identity)),
        );

        let orders: Arc<dyn OrdersService> = Arc::new(RemoteOrdersService::new(
            Arc::clone(&store),
            Arc::clone(&identity),
            Arc::clone(&stock),
            Arc::clone(&notifications),
        ));

        Self {
            catalog: Arc::new(RemoteCatalogService::new(Arc::clone(&store))),
            carts: Arc::new(RemoteCartsService::new(
                Arc::clone(&store),
                Arc::clone(&identity),
                Arc::clone(&stock),
            )),
            reviews: Arc::new(RemoteReviewsService::new(
                Arc::clone(&store),
                Arc::clone(&identity),
            )),
            profiles: Arc::new(RemoteProfilesService::new(
                Arc::clone(&store),
                Arc::clone(&identity),
            )),
            admin: Arc::new(RemoteAdminService::new(
                Arc::clone(&store),
                Arc::clone(&identity),
                Arc::clone(&stock),
                Arc::clone(&orders),
                objects,
            )),
            orders,
            notifications,
            stock,
            store,
            identity,
        }
    }

    /// Build application context over the `PostgreSQL` document backend,
    /// applying pending migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(
        url: &str,
        objects: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        Ok(Self::new(
            Arc::new(PgDocumentStore::new(pool)),
            objects,
            identity,
        ))
    }

    /// A fresh observable cart over this context's carts service.
    #[must_use]
    pub fn cart_store(&self) -> Arc<CartStore> {
        Arc::new(CartStore::new(Arc::clone(&self.carts)))
    }

    /// A fresh observable checkout, without a cart to refresh.
    #[must_use]
    pub fn checkout_store(&self) -> CheckoutStore {
        CheckoutStore::new(Arc::clone(&self.orders))
    }
}
