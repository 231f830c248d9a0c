//! In-process event bus
//!
//! Services publish a `ClosingEvent` after each successful mutation;
//! subscribers (cache invalidation, logging) react synchronously.

use std::sync::{Arc, RwLock};

use crate::domain::ClosingEvent;

/// Callback invoked for every published event
pub type Subscriber = Arc<dyn Fn(&ClosingEvent) + Send + Sync>;

#[derive(Default)]
pub struct ClosingEventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl ClosingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(subscriber);
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn publish(&self, event: &ClosingEvent) {
        // Clone the list so a subscriber may subscribe without deadlocking
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        tracing::debug!(
            event_type = event.event_type(),
            business_date = %event.business_date(),
            subscribers = subscribers.len(),
            "Publishing closing event"
        );

        for subscriber in subscribers {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl std::fmt::Debug for ClosingEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosingEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
