//! Background refresh of the dynamic layer.
//!
//! # Responsibilities
//! - Optionally fetch once inline at startup, surfacing failure to the caller
//! - Fetch on a fixed interval and publish each success
//! - Stop on request, discarding results that land after the stop

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::lifecycle::Shutdown;
use crate::observability::metrics::{SharedMetrics, SNAPSHOT_PUBLISHED};
use crate::polling::strategy::PollingStrategy;
use crate::remote::{FetchError, SnapshotFetcher, SnapshotStore};

/// Handle to the running poll loop. Dropping it stops polling.
pub struct PollingScheduler {
    shutdown: Arc<Shutdown>,
    store: Arc<SnapshotStore>,
    handle: Option<JoinHandle<()>>,
}

impl PollingScheduler {
    /// Start polling `fetcher` into `store`.
    ///
    /// With `sync_init`, the first fetch runs before this returns; if it
    /// fails, the error is returned and no background task is started.
    /// Must be called from within a Tokio runtime.
    pub async fn start<F: SnapshotFetcher>(
        fetcher: F,
        strategy: PollingStrategy,
        store: Arc<SnapshotStore>,
        metrics: SharedMetrics,
    ) -> Result<Self, FetchError> {
        if strategy.sync_init() {
            match fetcher.fetch().await {
                Ok(values) => {
                    let snapshot = store.publish(fetcher.origin(), values);
                    metrics.increment(SNAPSHOT_PUBLISHED, &[]);
                    tracing::info!(
                        sequence = snapshot.sequence(),
                        keys = snapshot.len(),
                        "Initial dynamic config snapshot published"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Initial dynamic config fetch failed");
                    return Err(e);
                }
            }
        }

        let shutdown = Arc::new(Shutdown::new());
        let rx = shutdown.subscribe();

        tracing::info!(
            interval_ms = strategy.interval().as_millis() as u64,
            sync_init = strategy.sync_init(),
            "Dynamic config polling starting"
        );

        let handle = tokio::spawn(poll_loop(
            fetcher,
            strategy,
            store.clone(),
            metrics,
            shutdown.clone(),
            rx,
        ));

        Ok(Self {
            shutdown,
            store,
            handle: Some(handle),
        })
    }

    /// Halt future ticks. A fetch already in flight may finish but its
    /// result is not published: the store is sealed before this returns.
    pub fn stop(&self) {
        if !self.shutdown.is_triggered() {
            tracing::info!("Dynamic config polling stopping");
        }
        self.store.seal();
        self.shutdown.trigger();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Stop and wait for the loop to exit, including any in-flight fetch.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Dynamic config polling task failed");
            }
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.store.seal();
        self.shutdown.trigger();
    }
}

async fn poll_loop<F: SnapshotFetcher>(
    fetcher: F,
    strategy: PollingStrategy,
    store: Arc<SnapshotStore>,
    metrics: SharedMetrics,
    shutdown: Arc<Shutdown>,
    mut rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = time::sleep(strategy.interval()) => {}
            _ = rx.recv() => {
                tracing::debug!("Dynamic config polling received shutdown signal");
                break;
            }
        }

        if shutdown.is_triggered() {
            break;
        }

        match fetcher.fetch().await {
            Ok(values) => match store.try_publish(fetcher.origin(), values) {
                Some(snapshot) => {
                    metrics.increment(SNAPSHOT_PUBLISHED, &[]);
                    tracing::debug!(
                        sequence = snapshot.sequence(),
                        keys = snapshot.len(),
                        "Dynamic config snapshot published"
                    );
                }
                None => {
                    tracing::debug!("Discarding dynamic config fetched after stop");
                    break;
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    sequence = store.sequence(),
                    "Dynamic config fetch failed. Keeping current snapshot."
                );
            }
        }
    }

    tracing::info!("Dynamic config polling stopped");
}
