//! Observable cart.
//!
//! A local mirror of the shopper's cart lines for UI layers. The remote store
//! stays authoritative: every mutation patches the mirror optimistically, then
//! re-fetches the whole cart whether or not the mutation succeeded. Errors never
//! propagate out of this type; they land on [`CartStore::last_error`].

use std::sync::Arc;

use petshop::pricing::{self, PricingError};
use tokio::sync::watch;
use tracing::warn;

use crate::{
    domain::{
        carts::{CartsService, CartsServiceError, models::CartLine},
        catalog::models::ItemId,
    },
    store::SubscriptionGuard,
};

pub struct CartStore {
    carts: Arc<dyn CartsService>,
    lines: Arc<watch::Sender<Vec<CartLine>>>,
    last_error: Arc<watch::Sender<Option<String>>>,
}

impl CartStore {
    #[must_use]
    pub fn new(carts: Arc<dyn CartsService>) -> Self {
        let (lines, _) = watch::channel(Vec::new());
        let (last_error, _) = watch::channel(None);

        Self {
            carts,
            lines: Arc::new(lines),
            last_error: Arc::new(last_error),
        }
    }

    /// Current mirrored lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.borrow().clone()
    }

    /// Receiver notified whenever the mirror changes.
    #[must_use]
    pub fn watch_lines(&self) -> watch::Receiver<Vec<CartLine>> {
        self.lines.subscribe()
    }

    /// Message of the most recent failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    #[must_use]
    pub fn watch_errors(&self) -> watch::Receiver<Option<String>> {
        self.last_error.subscribe()
    }

    pub fn clear_error(&self) {
        self.last_error.send_replace(None);
    }

    /// Sum of the discounted line totals in the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the subtotal does not fit.
    pub fn subtotal(&self) -> Result<u64, PricingError> {
        let lines = self.lines.borrow();
        let totals = lines
            .iter()
            .map(CartLine::line_total)
            .collect::<Result<Vec<_>, _>>()?;

        pricing::sum_totals(totals)
    }

    /// Replace the mirror with the remote cart.
    pub async fn fetch_all(&self) {
        match self.carts.list_lines().await {
            Ok(lines) => {
                self.lines.send_replace(lines);
            }
            Err(error) => self.fail(&error),
        }
    }

    /// Returns whether the item was added.
    pub async fn add_item(&self, item: &ItemId) -> bool {
        let result = self.carts.add_item(item).await;

        if let Ok(line) = &result {
            self.upsert(line.clone());
        }

        self.reconcile(result).await
    }

    /// Returns whether the quantity change was applied.
    pub async fn set_quantity(&self, line: &CartLine, quantity: i64) -> bool {
        let result = self.carts.set_quantity(line, quantity).await;

        self.patch(line, &result);
        self.reconcile(result).await
    }

    pub async fn increase(&self, line: &CartLine) -> bool {
        let result = self.carts.increase(line).await;

        self.patch(line, &result);
        self.reconcile(result).await
    }

    pub async fn decrease(&self, line: &CartLine) -> bool {
        let result = self.carts.decrease(line).await;

        self.patch(line, &result);
        self.reconcile(result).await
    }

    pub async fn remove_item(&self, line: &CartLine) -> bool {
        let result = self.carts.remove_item(line).await;

        if result.is_ok() {
            self.discard(line);
        }

        self.reconcile(result).await
    }

    /// Keep the mirror in step with the remote cart until the guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the subscription cannot be opened.
    pub async fn follow(&self) -> Result<SubscriptionGuard, CartsServiceError> {
        let mut snapshots = self.carts.subscribe().await?;
        let lines = Arc::clone(&self.lines);
        let last_error = Arc::clone(&self.last_error);

        let task = tokio::spawn(async move {
            while let Some(snapshot) = snapshots.next().await {
                match snapshot {
                    Ok(snapshot) => {
                        lines.send_replace(snapshot);
                    }
                    Err(error) => {
                        warn!(%error, "cart subscription failed");
                        last_error.send_replace(Some(error.to_string()));
                    }
                }
            }
        });

        Ok(SubscriptionGuard::new(&task))
    }

    async fn reconcile<T>(&self, result: Result<T, CartsServiceError>) -> bool {
        self.fetch_all().await;

        match result {
            Ok(_) => true,
            Err(error) => {
                self.fail(&error);
                false
            }
        }
    }

    fn fail(&self, error: &CartsServiceError) {
        warn!(%error, "cart operation failed");
        self.last_error.send_replace(Some(error.to_string()));
    }

    fn patch(&self, line: &CartLine, result: &Result<Option<CartLine>, CartsServiceError>) {
        match result {
            Ok(Some(updated)) => self.upsert(updated.clone()),
            Ok(None) => self.discard(line),
            Err(_) => {}
        }
    }

    fn upsert(&self, line: CartLine) {
        self.lines.send_modify(|lines| {
            match lines.iter_mut().find(|existing| existing.key() == line.key()) {
                Some(existing) => *existing = line,
                None => lines.push(line),
            }
        });
    }

    fn discard(&self, line: &CartLine) {
        let key = line.key();

        self.lines
            .send_modify(|lines| lines.retain(|existing| existing.key() != key));
    }
}
