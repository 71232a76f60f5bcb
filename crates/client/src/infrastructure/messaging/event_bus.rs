//! Push-based event fan-out, keyed by event kind.
//!
//! Subscribers register callbacks per kind; dispatch invokes the current
//! subscribers of the event's kind synchronously, in subscription order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::events::{GameEvent, GameEventKind};

type Callback = Box<dyn FnMut(&GameEvent) + Send>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    subscribers: HashMap<GameEventKind, Vec<(u64, Callback)>>,
}

/// Handle returned by subscribe; pass back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    kind: GameEventKind,
    id: u64,
}

/// Event bus for connection and command events.
///
/// The bus holds strong references to subscribers, so they persist until
/// explicitly removed or the bus is dropped.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event kind.
    pub async fn subscribe(
        &self,
        kind: GameEventKind,
        callback: impl FnMut(&GameEvent) + Send + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        Subscription { kind, id }
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        let mut inner = self.inner.lock().await;
        if let Some(list) = inner.subscribers.get_mut(&subscription.kind) {
            list.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Invoke every subscriber registered for the event's kind.
    pub async fn dispatch(&self, event: &GameEvent) {
        let mut inner = self.inner.lock().await;
        if let Some(list) = inner.subscribers.get_mut(&event.kind()) {
            for (_, callback) in list.iter_mut() {
                callback(event);
            }
        }
    }

    pub async fn subscriber_count(&self, kind: GameEventKind) -> usize {
        self.inner
            .lock()
            .await
            .subscribers
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
