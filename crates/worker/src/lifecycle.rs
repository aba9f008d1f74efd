//! Install and activate.
//!
//! ```text
//! installing --install ok--> waiting --activate--> active
//!      |                                             |
//!      +--install failed--> redundant <--retire------+
//! ```
//!
//! Install pre-caches the static asset list and the critical images with
//! bounded concurrency. Under [`PrecachePolicy::AllOrNothing`] every URL is
//! fetched before anything is written, so a single failure leaves the
//! stores untouched. Activate deletes every store outside the current
//! keep-set, claims open clients and broadcasts a [`ClientNotice`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, CacheRequest, CacheStorage, CachedResponse, Error, PrecachePolicy, StoreNames, StoreRole};
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;

use crate::fetch::{Network, resolve};

const ACTIVATED_MESSAGE: &str = "Service Worker activated successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    Waiting,
    Active,
    Redundant,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages posted to every controlled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientNotice {
    #[serde(rename = "SW_ACTIVATED")]
    Activated { version: String, message: String },
}

/// Result of a bulk pre-cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PrecacheOutcome {
    pub stored: usize,
    /// URLs that could not be fetched or returned a non-ok status.
    pub failed: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub version: String,
    pub stores: Vec<String>,
    pub precache: PrecacheOutcome,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub clients_claimed: bool,
}

/// Install/activate state machine for one worker version.
pub struct Lifecycle {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    names: StoreNames,
    static_assets: Vec<CacheRequest>,
    critical_images: Vec<CacheRequest>,
    policy: PrecachePolicy,
    concurrency: usize,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
    notices: broadcast::Sender<ClientNotice>,
}

impl Lifecycle {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = crate::fetch::parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let requests = |urls: &[String]| {
            urls.iter()
                .map(|u| {
                    resolve(&origin, u)
                        .map(CacheRequest::get)
                        .map_err(|e| Error::InvalidUrl(format!("pre-cache url {u}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let (notices, _) = broadcast::channel(16);

        Ok(Self {
            static_assets: requests(&config.static_assets)?,
            critical_images: requests(&config.critical_images)?,
            storage,
            network,
            names: config.store_names(),
            policy: config.precache_policy,
            concurrency: config.precache_concurrency.max(1),
            state: Mutex::new(WorkerState::Installing),
            skip_waiting: AtomicBool::new(config.skip_waiting),
            claimed: AtomicBool::new(false),
            notices,
        })
    }

    pub fn state(&self) -> WorkerState {
        *self.lock_state()
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    /// Ask to activate as soon as install has finished.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Whether open pages are controlled by this worker.
    pub fn clients_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientNotice> {
        self.notices.subscribe()
    }

    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.expect_state("install", WorkerState::Installing)?;
        tracing::info!(version = %self.names.version(), policy = ?self.policy, "installing");

        let mut jobs: Vec<(String, CacheRequest)> = Vec::new();
        let static_store = self.names.name(StoreRole::Static);
        let images_store = self.names.name(StoreRole::Images);
        jobs.extend(self.static_assets.iter().cloned().map(|r| (static_store.clone(), r)));
        jobs.extend(self.critical_images.iter().cloned().map(|r| (images_store.clone(), r)));

        let result = async {
            let fetched = fetch_all(&self.network, jobs, self.concurrency).await?;
            for store in self.names.keep_set() {
                self.storage.open(&store).await?;
            }
            commit(self.storage.as_ref(), fetched, self.policy).await
        }
        .await;

        match result {
            Ok(precache) => {
                *self.lock_state() = WorkerState::Waiting;
                if !precache.failed.is_empty() {
                    tracing::warn!(failed = ?precache.failed, "install completed with pre-cache failures");
                }
                tracing::info!(stored = precache.stored, total = precache.total, "install complete");
                Ok(InstallReport {
                    version: self.names.worker_version(),
                    stores: self.names.keep_set(),
                    precache,
                    skip_waiting: self.wants_skip_waiting(),
                })
            }
            Err(e) => {
                *self.lock_state() = WorkerState::Redundant;
                tracing::error!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.expect_state("activate", WorkerState::Waiting)?;
        tracing::info!(version = %self.names.version(), "activating");

        let mut deleted = Vec::new();
        for store in self.storage.store_names().await? {
            if self.names.is_current(&store) {
                continue;
            }
            match self.storage.delete_store(&store).await {
                Ok(_) => {
                    tracing::info!(store = %store, "deleted old cache");
                    deleted.push(store);
                }
                Err(e) => tracing::warn!(store = %store, error = %e, "failed to delete old cache"),
            }
        }

        self.claimed.store(true, Ordering::SeqCst);
        *self.lock_state() = WorkerState::Active;

        let notice = ClientNotice::Activated { version: self.names.worker_version(), message: ACTIVATED_MESSAGE.into() };
        if self.notices.send(notice).is_err() {
            tracing::debug!("no clients to notify");
        }

        Ok(ActivateReport {
            version: self.names.worker_version(),
            deleted,
            kept: self.names.keep_set(),
            clients_claimed: true,
        })
    }

    /// Superseded or discarded by the host.
    pub fn retire(&self) {
        *self.lock_state() = WorkerState::Redundant;
        self.claimed.store(false, Ordering::SeqCst);
    }

    fn expect_state(&self, action: &'static str, expected: WorkerState) -> Result<(), Error> {
        let state = self.state();
        if state == expected { Ok(()) } else { Err(Error::InvalidState { action, state: state.to_string() }) }
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fetch every URL and store it in `store`, like `Cache.addAll`.
pub async fn add_all(
    network: &Arc<dyn Network>, storage: &dyn CacheStorage, store: &str, requests: Vec<CacheRequest>,
    concurrency: usize, policy: PrecachePolicy,
) -> Result<PrecacheOutcome, Error> {
    let jobs = requests.into_iter().map(|r| (store.to_string(), r)).collect();
    let fetched = fetch_all(network, jobs, concurrency).await?;
    commit(storage, fetched, policy).await
}

struct Fetched {
    store: String,
    request: CacheRequest,
    result: Result<CachedResponse, Error>,
}

/// Fetch all jobs, at most `concurrency` at a time. Results keep input order.
async fn fetch_all(
    network: &Arc<dyn Network>, jobs: Vec<(String, CacheRequest)>, concurrency: usize,
) -> Result<Vec<Fetched>, Error> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (index, (store, request)) in jobs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let network = Arc::clone(network);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = network.fetch(&request).await;
            (index, Fetched { store, request, result })
        });
    }

    let mut fetched = Vec::with_capacity(join_set.len());
    while let Some(joined) = join_set.join_next().await {
        fetched.push(joined.map_err(|e| Error::NetworkFailed(format!("pre-cache task: {e}")))?);
    }
    fetched.sort_by_key(|(index, _)| *index);
    Ok(fetched.into_iter().map(|(_, f)| f).collect())
}

/// Write fetched responses according to `policy`.
async fn commit(storage: &dyn CacheStorage, fetched: Vec<Fetched>, policy: PrecachePolicy) -> Result<PrecacheOutcome, Error> {
    let total = fetched.len();
    let mut failed = Vec::new();
    let mut ok = Vec::with_capacity(total);

    for item in fetched {
        match item.result {
            Ok(response) if response.is_ok() => ok.push((item.store, item.request, response)),
            Ok(response) => {
                tracing::warn!(url = %item.request.url, status = response.status, "pre-cache got non-ok status");
                failed.push(item.request.url.to_string());
            }
            Err(e) => {
                tracing::warn!(url = %item.request.url, error = %e, "pre-cache fetch failed");
                failed.push(item.request.url.to_string());
            }
        }
    }

    if policy == PrecachePolicy::AllOrNothing && !failed.is_empty() {
        return Err(Error::InstallFailed { failed, total });
    }

    let mut stored = 0;
    for (store, request, response) in ok {
        match storage.put(&store, &request, &response).await {
            Ok(()) => stored += 1,
            Err(e) if policy == PrecachePolicy::Isolated => {
                tracing::warn!(store = %store, url = %request.url, error = %e, "pre-cache write failed");
                failed.push(request.url.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(PrecacheOutcome { stored, failed, total })
}
