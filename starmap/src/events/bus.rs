//! Synchronous publish/subscribe

use super::{EventKind, MapEvent};
use std::fmt;
use tracing::trace;

/// Callback receiving events
pub type EventHandler = Box<dyn FnMut(&MapEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every event
    filter: Option<EventKind>,
    handler: EventHandler,
}

/// Delivers each event to its subscribers in subscription order before
/// `emit` returns
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive events of one kind
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&MapEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(handler))
    }

    /// Receive every event
    pub fn subscribe_all(&mut self, handler: impl FnMut(&MapEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    fn add(&mut self, filter: Option<EventKind>, handler: EventHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            filter,
            handler,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Deliver `event`; returns how many handlers ran
    pub fn emit(&mut self, event: &MapEvent) -> usize {
        let kind = event.kind();
        trace!(event = kind.name(), "Emitting event");
        let mut delivered = 0;
        for subscription in &mut self.subscriptions {
            if subscription.filter.map_or(true, |k| k == kind) {
                (subscription.handler)(event);
                delivered += 1;
            }
        }
        delivered
    }
}
