//! Polling worker for scheduled refreshes

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::sync::coordinator::Coordinator;

/// Run the poller worker for one coordinator.
///
/// A failed refresh only degrades availability; the next tick retries.
pub async fn run<S, F>(
    coordinator: &Coordinator,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller for {} starting (every {:?})...", coordinator.name(), coordinator.interval());

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller for {} shutting down...", coordinator.name());
                return;
            }
            _ = sleep_fn(coordinator.interval()) => {}
        }

        debug!("Polling {}...", coordinator.name());

        match coordinator.refresh().await {
            Ok(_) => {
                debug!("{} refreshed", coordinator.name());
            }
            Err(e) => {
                warn!("{} refresh failed, retrying next tick: {}", coordinator.name(), e);
            }
        }
    }
}
