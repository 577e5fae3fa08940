//! The process-wide pub/sub event bus (C8), directly modeled on
//! `aion-core::events::EventBus`: a registry of handlers keyed by event
//! type, each fed through its own bounded queue so one slow subscriber can't
//! backpressure the publisher or its siblings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, warn};

use crate::event::{Event, EventType};

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Arc<Event>) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

struct Subscription {
    event_type: EventType,
    sender: mpsc::Sender<Arc<Event>>,
}

const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Bounded per-subscription channel; publishing never blocks on a slow
/// subscriber — an overflowing queue disconnects that subscriber instead
/// (spec.md §5).
pub struct EventBus {
    subscriptions: RwLock<HashMap<SubscriptionToken, Subscription>>,
    next_token: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscriptions: RwLock::new(HashMap::new()), next_token: AtomicU64::new(1) }
    }

    /// Registers `handler` for `event_type`, spawning a worker task that
    /// drains its bounded queue and invokes the handler; handler errors are
    /// logged and never propagate to the publisher.
    pub async fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>) -> SubscriptionToken {
        self.subscribe_with_capacity(event_type, handler, DEFAULT_QUEUE_CAPACITY).await
    }

    pub async fn subscribe_with_capacity(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
        queue_capacity: usize,
    ) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(queue_capacity);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(message) = handler.handle(event).await {
                    error!(%message, "event handler failed");
                }
            }
        });

        self.subscriptions.write().await.insert(token, Subscription { event_type, sender: tx });
        token
    }

    pub async fn unsubscribe(&self, token: SubscriptionToken) {
        self.subscriptions.write().await.remove(&token);
    }

    /// Delivers `event` to every subscriber registered for its type. A full
    /// queue disconnects that subscriber immediately rather than blocking.
    pub async fn publish(&self, event: Event) {
        let event = Arc::new(event);
        let mut dead = Vec::new();

        {
            let subs = self.subscriptions.read().await;
            for (token, sub) in subs.iter().filter(|(_, s)| s.event_type == event.event_type) {
                match sub.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(?token, "subscriber queue overflow, disconnecting");
                        dead.push(*token);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dead.push(*token);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut subs = self.subscriptions.write().await;
            for token in dead {
                subs.remove(&token);
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{sleep, Duration};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: Arc<Event>) -> Result<(), String> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl EventHandler for SlowHandler {
        async fn handle(&self, _event: Arc<Event>) -> Result<(), String> {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_only_to_subscribers_of_the_matching_type() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(EventType::JobCreated, Arc::new(CountingHandler { count: count.clone() })).await;

        bus.publish(Event::new(EventType::JobCreated, serde_json::json!({}))).await;
        bus.publish(Event::new(EventType::JobCompleted, serde_json::json!({}))).await;
        sleep(Duration::from_millis(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn overflowing_queue_disconnects_the_subscriber() {
        let bus = EventBus::new();
        bus.subscribe_with_capacity(EventType::DriftDetected, Arc::new(SlowHandler), 1).await;

        for _ in 0..10 {
            bus.publish(Event::new(EventType::DriftDetected, serde_json::json!({}))).await;
        }
        sleep(Duration::from_millis(20)).await;

        assert_eq!(bus.subscriber_count().await, 0);
    }
}
