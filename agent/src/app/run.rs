//! Integration lifecycle: setup, unload, reload and the main run loop

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::DeviceContext;
use crate::errors::WattrixError;
use crate::http::client::HttpClient;
use crate::http::device::DeviceApi;
use crate::server::serve::serve;
use crate::utils::calc_exp_backoff;
use crate::workers::{events, poller};

/// Run the Wattrix agent until `shutdown_signal` resolves.
///
/// Setup is retried with exponential backoff while the device is not ready;
/// configuration errors abort immediately.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), WattrixError> {
    info!("Initializing Wattrix Agent...");
    tokio::pin!(shutdown_signal);

    let mut attempt: u32 = 0;
    let integration = loop {
        match Integration::setup(options.clone()).await {
            Ok(integration) => break integration,
            Err(WattrixError::NotReady(reason)) => {
                let delay = calc_exp_backoff(&options.lifecycle.setup_retry, attempt);
                attempt = attempt.saturating_add(1);
                warn!(
                    "Device not ready (attempt {}): {}. Retrying setup in {:?}...",
                    attempt, reason, delay
                );

                tokio::select! {
                    _ = &mut shutdown_signal => {
                        info!("Shutdown signal received before setup completed");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => {
                error!("Failed to set up integration: {}", e);
                return Err(e);
            }
        }
    };

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");
    integration.unload().await
}

/// A set-up integration for one device
pub struct Integration {
    options: AppOptions,
    context: Arc<DeviceContext>,
    server_addr: Option<SocketAddr>,
    shutdown_manager: ShutdownManager,
}

impl std::fmt::Debug for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integration")
            .field("options", &self.options)
            .field("server_addr", &self.server_addr)
            .finish_non_exhaustive()
    }
}

impl Integration {
    /// Set up against the device at `options.device_base_url`
    pub async fn setup(options: AppOptions) -> Result<Self, WattrixError> {
        let client = HttpClient::new(&options.device_base_url, options.request_timeout)?;
        Self::setup_with_device(options, Arc::new(client)).await
    }

    /// Set up with an explicit device client
    pub async fn setup_with_device(
        options: AppOptions,
        device: Arc<dyn DeviceApi>,
    ) -> Result<Self, WattrixError> {
        info!("Setting up Wattrix integration for {}...", options.device_base_url);

        let context = Arc::new(
            DeviceContext::init(device, &options.device_base_url, &options).await?,
        );

        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        let mut shutdown_manager = ShutdownManager::new(shutdown_tx, options.lifecycle.clone());

        match start_workers(&options, &context, &mut shutdown_manager).await {
            Ok(server_addr) => Ok(Self {
                options,
                context,
                server_addr,
                shutdown_manager,
            }),
            Err(e) => {
                error!("Failed to start integration workers: {}", e);
                shutdown_manager.shutdown().await?;
                Err(e)
            }
        }
    }

    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    /// Address the local API is bound to, when enabled
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server_addr
    }

    /// Stop all workers and release the device context
    pub async fn unload(mut self) -> Result<(), WattrixError> {
        info!("Unloading Wattrix integration...");
        self.shutdown_manager.shutdown().await
    }

    /// Unload, then set up again with the same options and device client
    pub async fn reload(self) -> Result<Self, WattrixError> {
        let options = self.options.clone();
        let device = self.context.device.clone();
        self.unload().await?;
        Self::setup_with_device(options, device).await
    }
}

async fn start_workers(
    options: &AppOptions,
    context: &Arc<DeviceContext>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Option<SocketAddr>, WattrixError> {
    for coordinator in context.coordinators.all() {
        let coordinator = coordinator.clone();
        let mut shutdown_rx = shutdown_manager.subscribe();
        let handle = tokio::spawn(async move {
            poller::run(
                coordinator.as_ref(),
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = shutdown_rx.recv().await;
                }),
            )
            .await;
        });
        shutdown_manager.with_worker_handle(handle);
    }

    if options.enable_events {
        info!("Initializing device event worker...");
        let events_options = options.events.clone();
        let base_url = context.base_url.clone();
        let coordinator = context.coordinators.status.clone();
        let mut shutdown_rx = shutdown_manager.subscribe();
        let handle = tokio::spawn(async move {
            events::run(
                &events_options,
                base_url,
                coordinator,
                Box::pin(async move {
                    let _ = shutdown_rx.recv().await;
                }),
            )
            .await;
        });
        shutdown_manager.with_worker_handle(handle);
    }

    if !options.enable_server {
        return Ok(None);
    }

    info!("Initializing local HTTP server...");
    let mut shutdown_rx = shutdown_manager.subscribe();
    let (addr, handle) = serve(&options.server, context.clone(), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;
    shutdown_manager.with_server_handle(handle)?;

    Ok(Some(addr))
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    worker_handles: Vec<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), WattrixError>>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            worker_handles: Vec::new(),
            server_handle: None,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    fn with_worker_handle(&mut self, handle: JoinHandle<()>) {
        self.worker_handles.push(handle);
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), WattrixError>>,
    ) -> Result<(), WattrixError> {
        if self.server_handle.is_some() {
            return Err(WattrixError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), WattrixError> {
        let _ = self.shutdown_tx.send(());

        let abort_handles: Vec<AbortHandle> = self
            .worker_handles
            .iter()
            .map(JoinHandle::abort_handle)
            .chain(self.server_handle.iter().map(JoinHandle::abort_handle))
            .collect();

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, aborting remaining workers...",
                    self.lifecycle_options.max_shutdown_delay
                );
                abort_handles.iter().for_each(AbortHandle::abort);
                Err(WattrixError::ShutdownError(format!(
                    "timed out after {:?}",
                    self.lifecycle_options.max_shutdown_delay
                )))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), WattrixError> {
        info!("Shutting down Wattrix integration...");

        // 1. Pollers and event worker
        for handle in self.worker_handles.drain(..) {
            handle.await.map_err(|e| WattrixError::ShutdownError(e.to_string()))?;
        }

        // 2. Local server
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| WattrixError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
