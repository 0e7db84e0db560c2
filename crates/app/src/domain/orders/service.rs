//! Orders service.
//!
//! Materializes orders from a single item or from cart lines. Each line is
//! handled strictly in sequence: reserve stock, write the order, delete the
//! cart line. A failing line stops the run and leaves earlier orders in place.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use petshop::{keys, payment::PaymentMethod, status::OrderStatus};
use tracing::{Span, debug, info, warn};

use crate::{
    domain::{
        carts::{models::CartLine, repository::CartLinesRepository},
        catalog::models::{CatalogItem, ItemSnapshot},
        notifications::{NotificationsService, models::NewNotification},
        orders::{
            errors::OrdersServiceError,
            models::{Order, OrderId},
            repository::OrdersRepository,
        },
        stock::StockGate,
    },
    identity::{IdentityProvider, OwnerId},
    store::DocumentStore,
};

/// Attempts at claiming a free order key before giving up with
/// [`OrdersServiceError::Contended`].
const MAX_ORDER_KEY_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct RemoteOrdersService {
    identity: Arc<dyn IdentityProvider>,
    stock: Arc<dyn StockGate>,
    notifications: Arc<dyn NotificationsService>,
    orders: OrdersRepository,
    lines: CartLinesRepository,
}

impl RemoteOrdersService {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        stock: Arc<dyn StockGate>,
        notifications: Arc<dyn NotificationsService>,
    ) -> Self {
        Self {
            identity,
            stock,
            notifications,
            orders: OrdersRepository::new(Arc::clone(&store)),
            lines: CartLinesRepository::new(store),
        }
    }

    fn owner(&self) -> Result<OwnerId, OrdersServiceError> {
        self.identity
            .current_owner()
            .ok_or(OrdersServiceError::NotLoggedIn)
    }

    /// Reserve stock for one order and persist it as confirmed.
    async fn materialize(
        &self,
        owner: &OwnerId,
        item: &ItemSnapshot,
        quantity: u32,
        payment_method: &PaymentMethod,
    ) -> Result<Order, OrdersServiceError> {
        if quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }

        let total_price = item.line_total(quantity)?;

        self.stock.reserve(&item.id, quantity).await?;

        let order = match self
            .record(owner, item, quantity, total_price, payment_method)
            .await
        {
            Ok(order) => order,
            Err(error) => {
                if let Err(release) = self.stock.release(&item.id, quantity).await {
                    warn!(item_id = %item.id, quantity, error = %release, "failed to release reserved stock");
                }

                return Err(error);
            }
        };

        info!(order_id = %order.order_id, total_price, "order confirmed");

        self.announce(&order, "Order confirmed").await;

        Ok(order)
    }

    /// Write a confirmed order under the next free `{owner}_{item}_{seq}` key.
    ///
    /// Keys are only ever claimed, never overwritten, so overlapping confirmations
    /// for the same item end up as separate orders.
    async fn record(
        &self,
        owner: &OwnerId,
        item: &ItemSnapshot,
        quantity: u32,
        total_price: u64,
        payment_method: &PaymentMethod,
    ) -> Result<Order, OrdersServiceError> {
        for attempt in 1..=MAX_ORDER_KEY_ATTEMPTS {
            let sequence_index =
                keys::next_sequence(self.orders.sequences(owner, &item.id).await?);

            let order = Order {
                order_id: OrderId::new(keys::order_key(
                    owner.as_str(),
                    item.id.as_str(),
                    sequence_index,
                )),
                owner_id: owner.clone(),
                item_id: item.id.clone(),
                item: item.clone(),
                quantity,
                total_price,
                payment_method: payment_method.clone(),
                status: OrderStatus::Confirmed,
                sequence_index,
                created_at: Timestamp::now(),
            };

            if self.orders.create(&order).await? {
                return Ok(order);
            }

            debug!(order_id = %order.order_id, attempt, "order key taken, retrying");
        }

        Err(OrdersServiceError::Contended)
    }

    /// Best-effort notice to the order's owner; failures are only logged.
    async fn announce(&self, order: &Order, title: &str) {
        let notification = NewNotification {
            owner_id: order.owner_id.clone(),
            title: title.to_string(),
            body: format!(
                "{} x{}: {}",
                order.item.name, order.quantity, order.status
            ),
            order_id: Some(order.order_id.clone()),
        };

        if let Err(error) = self.notifications.notify(notification).await {
            warn!(order_id = %order.order_id, %error, "failed to write order notification");
        }
    }
}

#[async_trait]
impl OrdersService for RemoteOrdersService {
    #[tracing::instrument(
        name = "orders.service.confirm_direct",
        skip(self, item, payment_method),
        fields(item_id = %item.id, order_id = tracing::field::Empty),
        err
    )]
    async fn confirm_direct(
        &self,
        item: &CatalogItem,
        quantity: u32,
        payment_method: &str,
    ) -> Result<Order, OrdersServiceError> {
        let payment_method = PaymentMethod::parse(payment_method)?;
        let owner = self.owner()?;

        let order = self
            .materialize(&owner, &item.snapshot(), quantity, &payment_method)
            .await?;

        Span::current().record("order_id", tracing::field::display(&order.order_id));

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.service.confirm_from_cart",
        skip(self, lines, payment_method),
        fields(line_count = lines.len(), created = tracing::field::Empty),
        err
    )]
    async fn confirm_from_cart(
        &self,
        lines: &[CartLine],
        payment_method: &str,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let payment_method = PaymentMethod::parse(payment_method)?;
        let owner = self.owner()?;

        if lines.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        if lines.iter().any(|line| line.owner_id != owner) {
            return Err(OrdersServiceError::LineNotFound);
        }

        let mut created = Vec::with_capacity(lines.len());

        for line in lines {
            let halt = |source: OrdersServiceError, created: usize| OrdersServiceError::Halted {
                created,
                source: Box::new(source),
            };

            let order = self
                .materialize(&owner, &line.item, line.quantity, &payment_method)
                .await
                .map_err(|source| halt(source, created.len()))?;

            created.push(order);

            match self.lines.delete(line).await {
                Ok(true) => {}
                Ok(false) => warn!(line = %line.key(), "cart line already gone after checkout"),
                Err(error) => return Err(halt(error.into(), created.len())),
            }
        }

        Span::current().record("created", created.len());

        Ok(created)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError> {
        let owner = self.owner()?;

        Ok(self.orders.for_owner(&owner).await?)
    }

    async fn get_order(&self, order: &OrderId) -> Result<Order, OrdersServiceError> {
        let owner = self.owner()?;

        self.orders
            .get(order)
            .await?
            .filter(|order| order.owner_id == owner)
            .ok_or(OrdersServiceError::OrderNotFound)
    }

    async fn list_all_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        Ok(self.orders.all(status).await?)
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self, order),
        fields(order_id = %order),
        err
    )]
    async fn update_status(
        &self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut current = self
            .orders
            .get(order)
            .await?
            .ok_or(OrdersServiceError::OrderNotFound)?;

        // Statuses only move forward, so this settles within a few rounds.
        loop {
            if !current.status.can_transition_to(status) {
                return Err(OrdersServiceError::InvalidTransition {
                    from: current.status,
                    to: status,
                });
            }

            if self.orders.set_status(order, current.status, status).await? {
                break;
            }

            debug!(from = %current.status, "order status changed underneath, re-checking");

            current = self
                .orders
                .get(order)
                .await?
                .ok_or(OrdersServiceError::OrderNotFound)?;
        }

        if status == OrderStatus::Cancelled {
            self.stock.release(&current.item_id, current.quantity).await?;
        }

        let updated = Order { status, ..current };

        info!(status = %status, "order status changed");

        self.announce(&updated, "Order updated").await;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Buy `quantity` units of one item.
    async fn confirm_direct(
        &self,
        item: &CatalogItem,
        quantity: u32,
        payment_method: &str,
    ) -> Result<Order, OrdersServiceError>;

    /// Turn cart lines into orders, one per line, deleting each line once its
    /// order is written.
    ///
    /// Stops at the first failing line with [`OrdersServiceError::Halted`].
    async fn confirm_from_cart(
        &self,
        lines: &[CartLine],
        payment_method: &str,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// The current owner's orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, OrdersServiceError>;

    /// One of the current owner's orders.
    async fn get_order(&self, order: &OrderId) -> Result<Order, OrdersServiceError>;

    /// Every order, newest first, optionally with one status.
    async fn list_all_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Move an order along its lifecycle. Cancelling returns its units to stock.
    async fn update_status(
        &self,
        order: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}
