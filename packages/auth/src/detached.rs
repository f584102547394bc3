// ABOUTME: Background work that must outlive the request that started it
// ABOUTME: Tasks run on a shared JoinSet and are drained within a grace period at shutdown

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Fire-and-forget tasks detached from request cancellation
#[derive(Clone, Default)]
pub struct DetachedTasks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl DetachedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `future` in the background. Dropping the caller does not cancel it.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock();
        // Reap finished tasks so the set does not grow without bound
        while tasks.try_join_next().is_some() {}
        tasks.spawn(future);
    }

    /// Number of tasks not yet reaped
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait for outstanding tasks, aborting whatever is still running after `grace`.
    /// Returns true when everything finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let mut tasks = std::mem::take(&mut *self.lock());
        let pending = tasks.len();
        debug!(pending, "Draining detached tasks");

        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    if e.is_panic() {
                        warn!(error = %e, "Detached task panicked");
                    }
                }
            }
        })
        .await
        .is_ok();

        if !drained {
            warn!(remaining = tasks.len(), "Detached tasks did not finish in time, aborting");
            tasks.abort_all();
        }
        drained
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        // A panic while holding the lock leaves the set itself intact
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
