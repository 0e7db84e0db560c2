//! Observable checkout.
//!
//! Stages pending orders for review and submits them through
//! [`OrdersService`]. Like [`CartStore`], failures never escape: they become the
//! `last_error` message, and successes publish a short `last_message`.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use petshop::pricing::{self, PricingError};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{
    carts::{CartStore, models::CartLine},
    catalog::models::CatalogItem,
    orders::{OrdersService, OrdersServiceError, models::PendingOrder},
};

/// Holds the submitting flag for the length of one submission.
struct Submission<'a>(&'a AtomicBool);

impl<'a> Submission<'a> {
    fn begin(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CheckoutStore {
    orders: Arc<dyn OrdersService>,
    cart: Option<Arc<CartStore>>,
    pending: watch::Sender<Vec<PendingOrder>>,
    last_error: watch::Sender<Option<String>>,
    last_message: watch::Sender<Option<String>>,
    submitting: AtomicBool,
}

impl CheckoutStore {
    #[must_use]
    pub fn new(orders: Arc<dyn OrdersService>) -> Self {
        let (pending, _) = watch::channel(Vec::new());
        let (last_error, _) = watch::channel(None);
        let (last_message, _) = watch::channel(None);

        Self {
            orders,
            cart: None,
            pending,
            last_error,
            last_message,
            submitting: AtomicBool::new(false),
        }
    }

    /// Re-fetch `cart` after every cart checkout.
    #[must_use]
    pub fn with_cart(mut self, cart: Arc<CartStore>) -> Self {
        self.cart = Some(cart);
        self
    }

    #[must_use]
    pub fn pending(&self) -> Vec<PendingOrder> {
        self.pending.borrow().clone()
    }

    #[must_use]
    pub fn watch_pending(&self) -> watch::Receiver<Vec<PendingOrder>> {
        self.pending.subscribe()
    }

    /// Total of everything staged.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit.
    pub fn pending_total(&self) -> Result<u64, PricingError> {
        pricing::sum_totals(self.pending.borrow().iter().map(|order| order.total_price))
    }

    pub fn clear_pending(&self) {
        self.pending.send_replace(Vec::new());
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    #[must_use]
    pub fn watch_errors(&self) -> watch::Receiver<Option<String>> {
        self.last_error.subscribe()
    }

    /// Confirmation text of the most recent successful submission.
    #[must_use]
    pub fn last_message(&self) -> Option<String> {
        self.last_message.borrow().clone()
    }

    #[must_use]
    pub fn watch_messages(&self) -> watch::Receiver<Option<String>> {
        self.last_message.subscribe()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Stage a single-item purchase, replacing anything staged before.
    pub fn stage_direct(&self, item: &CatalogItem, quantity: u32) -> bool {
        match PendingOrder::direct(item, quantity) {
            Ok(order) => {
                self.pending.send_replace(vec![order]);
                true
            }
            Err(error) => {
                self.fail(&error);
                false
            }
        }
    }

    /// Stage one pending order per cart line, replacing anything staged before.
    pub fn stage_cart(&self, lines: &[CartLine]) -> bool {
        match lines
            .iter()
            .map(PendingOrder::from_line)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(orders) => {
                self.pending.send_replace(orders);
                true
            }
            Err(error) => {
                self.fail(&error);
                false
            }
        }
    }

    /// Returns whether the order was placed. Ignored while another submission
    /// is in flight.
    pub async fn confirm_direct(
        &self,
        item: &CatalogItem,
        quantity: u32,
        payment_method: &str,
    ) -> bool {
        let Some(_submission) = Submission::begin(&self.submitting) else {
            debug!(item_id = %item.id, "checkout already submitting");
            return false;
        };

        self.reset();

        match self
            .orders
            .confirm_direct(item, quantity, payment_method)
            .await
        {
            Ok(_) => {
                self.succeed("Order placed".to_string());
                true
            }
            Err(error) => {
                self.fail(&error);
                false
            }
        }
    }

    /// Returns whether every line was ordered. The cart is re-fetched either way.
    pub async fn confirm_from_cart(&self, lines: &[CartLine], payment_method: &str) -> bool {
        let Some(_submission) = Submission::begin(&self.submitting) else {
            debug!(lines = lines.len(), "checkout already submitting");
            return false;
        };

        self.reset();

        let result = self.orders.confirm_from_cart(lines, payment_method).await;

        if let Some(cart) = &self.cart {
            cart.fetch_all().await;
        }

        match result {
            Ok(orders) => {
                self.succeed(format!("Created {} orders", orders.len()));
                true
            }
            Err(error) => {
                if let OrdersServiceError::Halted { created, .. } = &error {
                    warn!(created, "cart checkout stopped part way");
                }

                self.fail(&error);
                false
            }
        }
    }

    fn reset(&self) {
        self.last_error.send_replace(None);
        self.last_message.send_replace(None);
    }

    fn succeed(&self, message: String) {
        self.pending.send_replace(Vec::new());
        self.last_message.send_replace(Some(message));
    }

    fn fail(&self, error: &dyn std::error::Error) {
        warn!(%error, "checkout failed");
        self.last_error.send_replace(Some(error.to_string()));
    }
}
