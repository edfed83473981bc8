use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::entities::order::OrderStatus;

/// What a tracking view needs to render an order's progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderSnapshot {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub driver_id: Option<Uuid>,
}

impl OrderSnapshot {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// In-process subscription hub for order status changes.
///
/// A subscriber always observes the current snapshot first and every
/// change thereafter; unsubscribing is dropping the receiver. Once a
/// terminal status is published the feed closes, which ends any stream
/// built on top of it.
#[derive(Debug, Default)]
pub struct OrderFeeds {
    feeds: Mutex<HashMap<Uuid, watch::Sender<OrderSnapshot>>>,
}

impl OrderFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an order's feed. `current` is the snapshot the caller
    /// just read from the store; it seeds the feed when no publisher has
    /// touched this order yet, so the first observed value is never stale
    /// relative to the database read.
    pub fn subscribe(&self, current: OrderSnapshot) -> watch::Receiver<OrderSnapshot> {
        if current.is_terminal() {
            // The order is already finished: hand out a receiver that
            // delivers the final snapshot and is born closed, without
            // re-inserting a feed nothing will ever publish to again
            let (sender, receiver) = watch::channel(current);
            drop(sender);
            return receiver;
        }

        let mut feeds = self.feeds.lock().unwrap_or_else(|e| e.into_inner());
        feeds
            .entry(current.order_id)
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    /// Publish a status change to any subscribed views. Terminal statuses
    /// close the feed.
    pub fn publish(&self, snapshot: OrderSnapshot) {
        let mut feeds = self.feeds.lock().unwrap_or_else(|e| e.into_inner());
        if snapshot.is_terminal() {
            if let Some(sender) = feeds.remove(&snapshot.order_id) {
                // Receivers see the terminal value, then the closed channel
                sender.send_replace(snapshot);
            }
            return;
        }

        feeds
            .entry(snapshot.order_id)
            .or_insert_with(|| watch::channel(snapshot).0)
            .send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::wrappers::WatchStream;
    use tokio_stream::StreamExt;

    fn snapshot(order_id: Uuid, status: OrderStatus) -> OrderSnapshot {
        OrderSnapshot {
            order_id,
            status,
            driver_id: None,
        }
    }

    #[tokio::test]
    async fn subscriber_sees_current_snapshot_first() {
        let feeds = OrderFeeds::new();
        let id = Uuid::new_v4();
        let rx = feeds.subscribe(snapshot(id, OrderStatus::Pending));

        let mut stream = WatchStream::new(rx);
        let first = stream.next().await.unwrap();
        assert_eq!(first.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn subscriber_sees_every_change() {
        let feeds = OrderFeeds::new();
        let id = Uuid::new_v4();
        let mut stream = WatchStream::new(feeds.subscribe(snapshot(id, OrderStatus::Pending)));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::Pending);

        feeds.publish(snapshot(id, OrderStatus::Accepted));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::Accepted);

        feeds.publish(snapshot(id, OrderStatus::OnTheWay));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::OnTheWay);
    }

    #[tokio::test]
    async fn terminal_status_closes_the_feed() {
        let feeds = OrderFeeds::new();
        let id = Uuid::new_v4();
        let mut stream = WatchStream::new(feeds.subscribe(snapshot(id, OrderStatus::OnTheWay)));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::OnTheWay);

        feeds.publish(snapshot(id, OrderStatus::Delivered));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::Delivered);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn subscribing_to_finished_order_closes_immediately() {
        let feeds = OrderFeeds::new();
        let id = Uuid::new_v4();

        // A view opened on an already-delivered order sees the final
        // snapshot once and then the end of the stream
        let mut stream = WatchStream::new(feeds.subscribe(snapshot(id, OrderStatus::Delivered)));
        assert_eq!(stream.next().await.unwrap().status, OrderStatus::Delivered);
        assert!(stream.next().await.is_none());

        let mut cancelled =
            WatchStream::new(feeds.subscribe(snapshot(id, OrderStatus::Cancelled)));
        assert_eq!(
            cancelled.next().await.unwrap().status,
            OrderStatus::Cancelled
        );
        assert!(cancelled.next().await.is_none());
    }

    #[tokio::test]
    async fn feeds_are_independent_per_order() {
        let feeds = OrderFeeds::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rx_a = feeds.subscribe(snapshot(a, OrderStatus::Pending));

        feeds.publish(snapshot(b, OrderStatus::Accepted));
        assert_eq!(rx_a.borrow().status, OrderStatus::Pending);
    }
}
