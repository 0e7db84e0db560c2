//! Push subscriptions.
//!
//! A subscription is a spawned producer task feeding full query snapshots into a
//! bounded channel. Dropping or cancelling the handle aborts the producer.

use std::{
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use serde::de::DeserializeOwned;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
};

use super::{Document, StoreError};

/// Snapshots buffered before the producer waits for the consumer.
pub(crate) const SNAPSHOT_BUFFER: usize = 8;

pub(crate) type SnapshotSender = mpsc::Sender<Result<Vec<Document>, StoreError>>;

/// Cancellable stream of full collection snapshots.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<Result<Vec<Document>, StoreError>>,
    producer: AbortHandle,
}

impl Subscription {
    /// Spawn `produce` with the sending half of a fresh snapshot channel.
    pub fn spawn<F, Fut>(produce: F) -> Self
    where
        F: FnOnce(SnapshotSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
        let producer = tokio::spawn(produce(sender)).abort_handle();

        Self { receiver, producer }
    }

    /// Next snapshot, or `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<Result<Vec<Document>, StoreError>> {
        self.receiver.recv().await
    }

    /// Stop the producer. Equivalent to dropping the subscription.
    pub fn cancel(self) {
        drop(self);
    }

    /// Decode every snapshot into `T`.
    #[must_use]
    pub fn typed<T: DeserializeOwned>(self) -> Snapshots<T> {
        Snapshots {
            inner: self,
            model: PhantomData,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

impl Stream for Subscription {
    type Item = Result<Vec<Document>, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// A [`Subscription`] decoding its documents into models.
#[derive(Debug)]
pub struct Snapshots<T> {
    inner: Subscription,
    model: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Snapshots<T> {
    /// Next decoded snapshot, or `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<Result<Vec<T>, StoreError>> {
        self.inner.next().await.map(decode_snapshot)
    }

    /// Stop the producer.
    pub fn cancel(self) {
        self.inner.cancel();
    }
}

impl<T: DeserializeOwned> Stream for Snapshots<T> {
    type Item = Result<Vec<T>, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner)
            .poll_next(cx)
            .map(|snapshot| snapshot.map(decode_snapshot))
    }
}

fn decode_snapshot<T: DeserializeOwned>(
    snapshot: Result<Vec<Document>, StoreError>,
) -> Result<Vec<T>, StoreError> {
    snapshot?.iter().map(Document::decode).collect()
}

/// Keeps a consumer task alive; aborts it when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    task: AbortHandle,
}

impl SubscriptionGuard {
    #[must_use]
    pub fn new<T>(task: &JoinHandle<T>) -> Self {
        Self {
            task: task.abort_handle(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
