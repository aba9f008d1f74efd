//! The worker as the host sees it: one object per version, one method per event.

use std::sync::Arc;

use swcache_core::cache::SweepReport;
use swcache_core::{AppConfig, CacheRequest, CacheStorage, Error, PrecachePolicy, StoreNames, StoreRole};
use tokio::task::JoinHandle;

use crate::fetch::{Network, resolve};
use crate::lifecycle::{self, ActivateReport, InstallReport, Lifecycle, WorkerState};
use crate::messages::{ControlMessage, MessageReply};
use crate::push::{self, Notification};
use crate::router::{Routed, Router};
use crate::sweep;

pub struct ServiceWorker {
    config: AppConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    router: Router,
    lifecycle: Lifecycle,
}

impl ServiceWorker {
    pub fn new(config: AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let router = Router::new(&config, Arc::clone(&storage), Arc::clone(&network))?;
        let lifecycle = Lifecycle::new(&config, Arc::clone(&storage), Arc::clone(&network))?;
        Ok(Self { config, storage, network, router, lifecycle })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// The network used for pass-through requests and strategy fetches.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn names(&self) -> &StoreNames {
        self.router.names()
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.activate().await
    }

    /// Handle an intercepted fetch. Until the worker is active nothing is
    /// intercepted.
    pub async fn on_fetch(&self, request: &CacheRequest) -> Routed {
        if self.state() != WorkerState::Active {
            tracing::trace!(url = %request.url, state = %self.state(), "not controlling, pass-through");
            return Routed::PassThrough;
        }
        self.router.handle(request).await
    }

    /// Handle a posted control message. `None` means no reply is sent.
    pub async fn on_message(&self, message: &serde_json::Value) -> Option<MessageReply> {
        let message = ControlMessage::parse(message)?;
        tracing::debug!(?message, "control message");

        match message {
            ControlMessage::SkipWaiting => {
                self.lifecycle.skip_waiting();
                if self.state() == WorkerState::Waiting
                    && let Err(e) = self.lifecycle.activate().await
                {
                    tracing::error!(error = %e, "activation after skip-waiting failed");
                }
                None
            }
            ControlMessage::GetVersion => Some(MessageReply::Version { version: self.names().worker_version() }),
            ControlMessage::ClearCache => Some(match self.storage.clear_all().await {
                Ok(removed) => {
                    tracing::info!(removed, "cleared all caches");
                    MessageReply::success()
                }
                Err(e) => MessageReply::failure(e),
            }),
            ControlMessage::CacheUrls { urls } => Some(match self.cache_urls(&urls).await {
                Ok(()) => MessageReply::success(),
                Err(e) => {
                    tracing::warn!(error = %e, "caching requested urls failed");
                    MessageReply::failure(e)
                }
            }),
        }
    }

    async fn cache_urls(&self, urls: &[String]) -> Result<(), Error> {
        let origin = self.router.classifier().origin();
        let requests = urls
            .iter()
            .map(|u| resolve(origin, u).map(CacheRequest::get).map_err(|e| Error::InvalidUrl(format!("{u}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        lifecycle::add_all(
            &self.network,
            self.storage.as_ref(),
            &self.names().name(StoreRole::Dynamic),
            requests,
            self.config.precache_concurrency,
            PrecachePolicy::AllOrNothing,
        )
        .await
        .map(|_| ())
    }

    pub fn on_push(&self, payload: Option<&[u8]>) -> Notification {
        tracing::info!(bytes = payload.map_or(0, <[u8]>::len), "push received");
        Notification::from_push(payload, &self.config.app_name, chrono::Utc::now())
    }

    /// URL to open for a clicked notification action, if any.
    pub fn on_notification_click(&self, action: &str) -> Option<String> {
        tracing::info!(action, "notification clicked");
        push::route_click(action, &self.config.notification_routes)
    }

    pub async fn sweep(&self) -> Result<SweepReport, Error> {
        sweep::run_once(self.storage.as_ref(), self.names(), self.config.retention()).await
    }

    pub fn spawn_sweep(&self) -> JoinHandle<()> {
        sweep::spawn_periodic(
            Arc::clone(&self.storage),
            self.names().clone(),
            self.config.retention(),
            self.config.sweep_interval(),
        )
    }

    /// Wait for background refreshes still in flight.
    pub async fn settle(&self) -> usize {
        self.router.pending().settle().await
    }
}
