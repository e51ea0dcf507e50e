//! Listener registry for coordinator updates

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use chrono::{DateTime, Utc};

use crate::models::status::StatusSnapshot;

/// What listeners receive after a refresh
#[derive(Debug, Clone)]
pub struct RefreshEvent {
    pub coordinator: String,
    pub data: StatusSnapshot,
    pub last_update_success: bool,
    pub at: DateTime<Utc>,
}

type Callback = Box<dyn Fn(&RefreshEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    active: AtomicBool,
    callback: Callback,
}

/// Ordered set of subscribed listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<Arc<ListenerEntry>>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener; it stays subscribed for as long as the returned
    /// handle lives.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        let entry = Arc::new(ListenerEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(entry.clone());

        Subscription {
            entry,
            registry: Arc::downgrade(self),
        }
    }

    /// Invoke every listener once, in subscription order.
    ///
    /// The list is copied before the fan-out so listeners may subscribe or
    /// unsubscribe from inside a callback. Each entry is re-checked right
    /// before its call.
    pub fn notify(&self, event: &RefreshEvent) {
        let entries: Vec<Arc<ListenerEntry>> = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.clone()
        };

        for entry in entries {
            if entry.active.load(Ordering::SeqCst) {
                (entry.callback)(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|entry| entry.id != id);
    }
}

/// Handle to a registered listener. Dropping it unsubscribes.
pub struct Subscription {
    entry: Arc<ListenerEntry>,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.entry.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.entry.active.store(false, Ordering::SeqCst);
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.entry.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.entry.id)
            .field("active", &self.is_active())
            .finish()
    }
}
