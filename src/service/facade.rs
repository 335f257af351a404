//! The queryable merged view.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::observability::metrics::SharedMetrics;
use crate::polling::{PollingScheduler, PollingStrategy};
use crate::remote::{DynamicSnapshot, RemoteFetcher, SnapshotFetcher, SnapshotStore};
use crate::service::settings::DynamicSettings;

/// Static chain plus optional dynamic layer, queried by key.
///
/// Lookups consult the current dynamic snapshot first (only when the dynamic
/// layer is enabled), then the static chain from highest to lowest priority.
pub struct ConfigService {
    static_chain: ConfigLayer,
    snapshots: Arc<SnapshotStore>,
    dynamic_enabled: bool,
    scheduler: Option<PollingScheduler>,
}

impl ConfigService {
    /// Build a view over `static_chain` without starting any polling.
    ///
    /// When `dynamic_enabled` is false, snapshots are never consulted even if
    /// something publishes into [`ConfigService::snapshots`].
    pub fn new(static_chain: ConfigLayer, dynamic_enabled: bool) -> Self {
        Self {
            static_chain,
            snapshots: Arc::new(SnapshotStore::new()),
            dynamic_enabled,
            scheduler: None,
        }
    }

    /// Build a view with the dynamic layer enabled and polled by `fetcher`.
    ///
    /// With a synchronous first fetch, its failure aborts construction.
    pub async fn with_polling<F: SnapshotFetcher>(
        static_chain: ConfigLayer,
        fetcher: F,
        strategy: PollingStrategy,
        metrics: SharedMetrics,
    ) -> Result<Self> {
        let mut service = Self::new(static_chain, true);
        let scheduler =
            PollingScheduler::start(fetcher, strategy, service.snapshots.clone(), metrics).await?;
        service.scheduler = Some(scheduler);
        Ok(service)
    }

    /// Build a view according to already parsed dynamic settings.
    pub async fn from_settings(
        static_chain: ConfigLayer,
        settings: &DynamicSettings,
        metrics: SharedMetrics,
    ) -> Result<Self> {
        match settings {
            DynamicSettings::Disabled => {
                tracing::info!("Dynamic config layer disabled");
                Ok(Self::new(static_chain, false))
            }
            DynamicSettings::Enabled {
                url,
                strategy,
                fetch_timeout,
            } => {
                tracing::info!(url = %url, "Dynamic config layer enabled");
                let fetcher = RemoteFetcher::new(url.clone(), *fetch_timeout, metrics.clone())?;
                Self::with_polling(static_chain, fetcher, *strategy, metrics).await
            }
        }
    }

    /// Build a view, reading the dynamic settings from the static chain itself.
    pub async fn from_resolved(static_chain: ConfigLayer, metrics: SharedMetrics) -> Result<Self> {
        let settings = DynamicSettings::from_layer(&static_chain)?;
        Self::from_settings(static_chain, &settings, metrics).await
    }

    /// Dynamic value if present, else the first static match.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(snapshot) = self.snapshot() {
            if let Some(value) = snapshot.get(key) {
                return Some(value.to_string());
            }
        }
        self.static_chain.get(key).map(str::to_string)
    }

    /// Like [`ConfigService::get`] but absence is an error.
    pub fn get_required(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    /// All keys across the static chain and the current snapshot, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = self.static_chain.keys();
        if let Some(snapshot) = self.snapshot() {
            keys.extend(snapshot.values().keys().cloned());
        }
        keys
    }

    /// Sorted key/value view of everything visible right now.
    ///
    /// The snapshot is loaded once, so the result never mixes two snapshots.
    pub fn props(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        for layer in self.static_chain.layers() {
            for (key, value) in layer.values() {
                props.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        if let Some(snapshot) = self.snapshot() {
            props.extend(snapshot.values().clone());
        }
        props
    }

    /// Current snapshot, always `None` while the dynamic layer is disabled.
    pub fn snapshot(&self) -> Option<Arc<DynamicSnapshot>> {
        if self.dynamic_enabled {
            self.snapshots.load()
        } else {
            None
        }
    }

    /// The store the dynamic layer publishes into.
    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    pub fn static_chain(&self) -> &ConfigLayer {
        &self.static_chain
    }

    pub fn is_dynamic_enabled(&self) -> bool {
        self.dynamic_enabled
    }

    /// Whether a scheduler is running (not yet stopped).
    pub fn is_polling(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|s| !s.is_stopped())
    }

    /// Stop polling. Values already published stay visible.
    pub fn stop(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop();
        }
    }

    /// Stop polling and wait for the background task to finish.
    pub async fn shutdown(mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{PropertyMap, SourceOrigin};

    fn map(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn remote() -> SourceOrigin {
        SourceOrigin::Remote("http://config.local/props".to_string())
    }

    fn chain() -> ConfigLayer {
        let base = ConfigLayer::new(
            "base",
            SourceOrigin::Resource,
            map(&[("a", "1"), ("b", "2")]),
            None,
        );
        ConfigLayer::new(
            "overlay",
            SourceOrigin::Resource,
            map(&[("b", "3")]),
            Some(Arc::new(base)),
        )
    }

    #[test]
    fn test_static_lookup() {
        let service = ConfigService::new(chain(), false);
        assert_eq!(service.get("a").as_deref(), Some("1"));
        assert_eq!(service.get("b").as_deref(), Some("3"));
        assert_eq!(service.get("zzz"), None);
        assert!(!service.is_polling());
    }

    #[test]
    fn test_snapshot_overrides_static_when_enabled() {
        let service = ConfigService::new(chain(), true);
        service.snapshots().publish(remote(), map(&[("a", "10"), ("e", "5")]));

        assert_eq!(service.get("a").as_deref(), Some("10"));
        assert_eq!(service.get("b").as_deref(), Some("3"));
        let keys: Vec<_> = service.keys().into_iter().collect();
        assert_eq!(keys, vec!["a", "b", "e"]);
    }

    #[test]
    fn test_disabled_ignores_snapshots() {
        let service = ConfigService::new(chain(), false);
        service.snapshots().publish(remote(), map(&[("a", "10"), ("e", "5")]));

        assert_eq!(service.get("a").as_deref(), Some("1"));
        assert_eq!(service.get("e"), None);
        assert!(service.snapshot().is_none());
        assert!(!service.keys().contains("e"));
    }

    #[test]
    fn test_get_required() {
        let service = ConfigService::new(chain(), false);
        assert_eq!(service.get_required("a").unwrap(), "1");

        let err = service.get_required("missing").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key } if key == "missing"));
    }

    #[test]
    fn test_props_sorted_and_merged() {
        let service = ConfigService::new(chain(), true);
        service.snapshots().publish(remote(), map(&[("b", "30")]));

        let props: Vec<_> = service.props().into_iter().collect();
        assert_eq!(
            props,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "30".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_from_resolved_disabled_makes_no_scheduler() {
        let service = ConfigService::from_resolved(chain(), SharedMetrics::default())
            .await
            .unwrap();
        assert!(!service.is_dynamic_enabled());
        assert!(!service.is_polling());
        service.shutdown().await;
    }
}
