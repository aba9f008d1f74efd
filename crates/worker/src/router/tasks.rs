//! Detached background work.
//!
//! Refreshes started by a strategy are registered here and never awaited by
//! the request that started them. Their errors are logged and dropped.
//! `settle` lets the host wait for everything still in flight, which keeps
//! the worker alive long enough for best-effort writes to land.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use swcache_core::Error;
use tokio::task::JoinSet;

#[derive(Default)]
pub struct PendingWork {
    tasks: Mutex<JoinSet<()>>,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` in the background without awaiting it.
    ///
    /// Tasks that already finished are collected first, so the set only
    /// holds work still in flight.
    pub fn wait_until<F>(&self, label: &'static str, work: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let mut tasks = self.lock();
        while let Some(result) = tasks.try_join_next() {
            log_join(result);
        }
        tasks.spawn(async move {
            if let Err(e) = work.await {
                tracing::debug!(task = label, error = %e, "background task failed");
            }
        });
    }

    /// Number of tasks not yet collected.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Await every task registered so far. Returns how many finished.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.lock());
        let mut finished = 0;
        while let Some(result) = tasks.join_next().await {
            log_join(result);
            finished += 1;
        }
        finished
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "background task panicked or was cancelled");
    }
}
