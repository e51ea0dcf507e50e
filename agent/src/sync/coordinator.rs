//! Refresh coordinator: owns one device read's cached snapshot

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::WattrixError;
use crate::models::pending::{PendingField, PendingWrites};
use crate::models::status::{keys, StatusSnapshot};
use crate::sync::listeners::{ListenerRegistry, RefreshEvent, Subscription};
use crate::sync::source::UpdateSource;

/// Coordinator options
#[derive(Debug, Clone)]
pub struct Options {
    /// Name used in logs and events
    pub name: String,

    /// Interval between scheduled refreshes
    pub interval: Duration,

    /// Upper bound for one fetch
    pub timeout: Duration,

    /// Seed and track pending write values from reads
    pub track_pending_writes: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: "Wattrix data coordinator".to_string(),
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(10),
            track_pending_writes: true,
        }
    }
}

/// What triggered a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    Scheduled,
    Requested,
}

/// Mutable coordinator state
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub data: StatusSnapshot,
    pub last_update_success: bool,
    pub last_update_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub pending: PendingWrites,
    pending_seeded: bool,
}

/// Shared refresh coordinator
pub struct Coordinator {
    options: Options,
    source: Arc<dyn UpdateSource>,
    state: RwLock<CoordinatorState>,
    listeners: Arc<ListenerRegistry>,

    // Refresh serialization: one execution at a time, and an execution covers
    // every request whose ticket was issued before it started.
    refresh_lock: Mutex<()>,
    requested: AtomicU64,
    covered: AtomicU64,
    executions: AtomicU64,
}

impl Coordinator {
    pub fn new(options: Options, source: Arc<dyn UpdateSource>) -> Self {
        Self {
            options,
            source,
            state: RwLock::new(CoordinatorState::default()),
            listeners: ListenerRegistry::new(),
            refresh_lock: Mutex::new(()),
            requested: AtomicU64::new(0),
            covered: AtomicU64::new(0),
            executions: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn interval(&self) -> Duration {
        self.options.interval
    }

    // ------------------------------ READ ACCESS ------------------------------ //

    /// Copy of the cached snapshot
    pub fn data(&self) -> StatusSnapshot {
        self.read_state().data.clone()
    }

    /// One cached field
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read_state().data.get(key).cloned()
    }

    pub fn last_update_success(&self) -> bool {
        self.read_state().last_update_success
    }

    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        self.read_state().last_update_at
    }

    pub fn last_error(&self) -> Option<String> {
        self.read_state().last_error.clone()
    }

    pub fn pending(&self) -> PendingWrites {
        self.read_state().pending
    }

    /// Number of fetches actually executed
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CoordinatorState {
        self.read_state().clone()
    }

    // ------------------------------ LOCAL WRITES ----------------------------- //

    /// Record a user edit of a pending value
    pub fn set_pending(&self, field: PendingField, value: f64) {
        let mut state = self.write_state();
        state.pending.set(field, value);
        state.pending_seeded = true;
        debug!("{}: {} set to {}", self.options.name, field.key(), value);
    }

    /// Overwrite one cached field after a write the device accepted
    pub fn set_value(&self, key: &str, value: Value) {
        let mut state = self.write_state();
        state.data.insert(key, value);
    }

    // ------------------------------- LISTENERS ------------------------------- //

    /// Subscribe to refresh notifications
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // -------------------------------- REFRESH -------------------------------- //

    /// First refresh at setup; a failure means the device is not ready
    pub async fn first_refresh(&self) -> Result<(), WattrixError> {
        self.refresh_coalesced(RefreshTrigger::Initial)
            .await
            .map_err(|e| WattrixError::NotReady(format!("{}: {}", self.options.name, e)))
    }

    /// Refresh driven by the poll timer
    pub async fn refresh(&self) -> Result<(), WattrixError> {
        self.refresh_coalesced(RefreshTrigger::Scheduled).await
    }

    /// Out-of-cycle refresh, e.g. right after a mode change.
    ///
    /// Requests that arrive while a refresh is in flight are folded into a
    /// single follow-up execution.
    pub async fn request_refresh(&self) -> Result<(), WattrixError> {
        self.refresh_coalesced(RefreshTrigger::Requested).await
    }

    async fn refresh_coalesced(&self, trigger: RefreshTrigger) -> Result<(), WattrixError> {
        let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.refresh_lock.lock().await;

        if self.covered.load(Ordering::SeqCst) >= ticket {
            debug!("{}: refresh coalesced into a completed run", self.options.name);
            return self.last_outcome();
        }

        let covers = self.requested.load(Ordering::SeqCst);
        let result = self.execute(trigger).await;
        self.covered.store(covers, Ordering::SeqCst);
        result
    }

    fn last_outcome(&self) -> Result<(), WattrixError> {
        let state = self.read_state();
        if state.last_update_success {
            Ok(())
        } else {
            Err(WattrixError::UpdateFailed(
                state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "no data received".to_string()),
            ))
        }
    }

    async fn execute(&self, trigger: RefreshTrigger) -> Result<(), WattrixError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        debug!("{}: {:?} refresh", self.options.name, trigger);

        let outcome = match tokio::time::timeout(self.options.timeout, self.source.fetch()).await {
            Ok(Ok(payload)) if payload.is_empty() => Err("no data received".to_string()),
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.options.timeout)),
        };

        match outcome {
            Ok(payload) => {
                let event = self.apply_success(payload);
                self.listeners.notify(&event);
                Ok(())
            }
            Err(reason) => {
                warn!("{}: communication failed: {}", self.options.name, reason);
                if let Some(event) = self.apply_failure(&reason) {
                    self.listeners.notify(&event);
                }
                Err(WattrixError::UpdateFailed(reason))
            }
        }
    }

    fn apply_success(&self, payload: StatusSnapshot) -> RefreshEvent {
        let mut state = self.write_state();

        if self.options.track_pending_writes {
            let mode_changed = match (state.data.get(keys::MODE), payload.get(keys::MODE)) {
                (Some(cached), Some(reported)) => cached != reported,
                _ => false,
            };

            if !state.pending_seeded {
                state.pending = PendingWrites::from_snapshot(&payload);
                state.pending_seeded = true;
                debug!("{}: pending values seeded: {:?}", self.options.name, state.pending);
            } else if mode_changed {
                state.pending.adopt_applied(&payload);
                info!(
                    "{}: device reports mode change, pending values reset to {:?}",
                    self.options.name, state.pending
                );
            }
        }

        let merged = state.data.merge(payload);
        let now = Utc::now();
        state.last_update_success = true;
        state.last_update_at = Some(now);
        state.last_error = None;
        debug!("{}: merged {} fields: {:?}", self.options.name, merged, state.data);

        RefreshEvent {
            coordinator: self.options.name.clone(),
            data: state.data.clone(),
            last_update_success: true,
            at: now,
        }
    }

    /// Returns an event when availability just went from up to down
    fn apply_failure(&self, reason: &str) -> Option<RefreshEvent> {
        let mut state = self.write_state();
        let was_available = state.last_update_success;
        state.last_update_success = false;
        state.last_error = Some(reason.to_string());

        was_available.then(|| RefreshEvent {
            coordinator: self.options.name.clone(),
            data: state.data.clone(),
            last_update_success: false,
            at: Utc::now(),
        })
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("options", &self.options)
            .field("state", &*self.read_state())
            .finish()
    }
}
