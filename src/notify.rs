//! In-process fan-out of newly created orders to live admin connections.
//!
//! Every subscriber owns a bounded queue. Publishing never waits: a
//! subscriber whose queue is full or whose receiver is gone is dropped.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{Order, OrderItem};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderCreated { order: Order, items: Vec<OrderItem> },
}

pub struct Subscription {
    pub id: u64,
    pub rx: mpsc::Receiver<Arc<str>>,
}

pub struct OrderHub {
    subscribers: DashMap<u64, mpsc::Sender<Arc<str>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl OrderHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(id, tx);
        tracing::debug!(subscriber = id, "order hub subscriber added");
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscriber = id, "order hub subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Serialize once and offer the message to every subscriber.
    /// Returns how many subscribers accepted it.
    pub fn publish(&self, event: &OrderEvent) -> usize {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode order event");
                return 0;
            }
        };

        let mut delivered = 0;
        self.subscribers.retain(|id, tx| match tx.try_send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(subscriber = *id, "dropping slow order subscriber");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        delivered
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    fn created() -> OrderEvent {
        OrderEvent::OrderCreated {
            order: Order {
                id: Uuid::new_v4(),
                user_id: "user-1".into(),
                shipping_cost: dec!(30),
                total_amount: dec!(70),
                status: "pending".into(),
                payment_status: "pending".into(),
                payment_method: "cod".into(),
                order_ref: "20250101000000-ref".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let hub = OrderHub::new(4);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        assert_eq!(hub.publish(&created()), 2);

        let message = first.rx.recv().await.expect("first message");
        assert!(message.contains("\"type\":\"order_created\""));
        assert!(second.rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_queue_drops_the_subscriber() {
        let hub = OrderHub::new(1);
        let _slow = hub.subscribe();

        assert_eq!(hub.publish(&created()), 1);
        assert_eq!(hub.publish(&created()), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn closed_receivers_are_pruned() {
        let hub = OrderHub::new(4);
        let gone = hub.subscribe();
        drop(gone.rx);
        let _live = hub.subscribe();

        assert_eq!(hub.publish(&created()), 1);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
