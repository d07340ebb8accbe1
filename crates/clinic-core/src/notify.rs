//! User-facing notices and typed refresh signaling.
//!
//! A [`Notice`] is what the host UI shows as a toast. The [`RefreshBus`]
//! tells views that a collection changed so they reload it.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Collections views can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Animals,
    Contacts,
    Events,
    Invoices,
}

/// What changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub topic: Topic,
    pub ids: Vec<String>,
}

type Listener = Arc<dyn Fn(&Change) + Send + Sync>;

/// Subscription handle; pass to [`RefreshBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Topic, Listener)>,
}

/// Typed publish/subscribe for collection refreshes.
#[derive(Default)]
pub struct RefreshBus {
    listeners: Mutex<Listeners>,
}

impl RefreshBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let mut guard = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.next_id += 1;
        let id = SubscriptionId(guard.next_id);
        guard.entries.push((id, topic, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut guard = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entries.retain(|(entry_id, _, _)| *entry_id != id);
    }

    /// Notify listeners of `topic`. Listeners run after the lock is released,
    /// so they may subscribe or publish themselves.
    pub fn publish(&self, topic: Topic, ids: Vec<String>) {
        let targets: Vec<Listener> = {
            let guard = match self.listeners.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard
                .entries
                .iter()
                .filter(|(_, t, _)| *t == topic)
                .map(|(_, _, listener)| Arc::clone(listener))
                .collect()
        };

        tracing::debug!(topic = ?topic, count = ids.len(), listeners = targets.len(), "publishing refresh");
        let change = Change { topic, ids };
        for listener in targets {
            listener(&change);
        }
    }
}
