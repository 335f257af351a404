//! Layered runtime configuration with an optional polled remote layer.

pub mod error;
pub mod layer;
pub mod lifecycle;
pub mod observability;
pub mod polling;
pub mod remote;
pub mod service;
pub mod source;

pub use error::{ConfigError, Result};
pub use layer::{ConfigLayer, LayerResolver, ResolverOptions};
pub use observability::metrics::{GlobalMetrics, MetricsSink, SharedMetrics};
pub use polling::{PollingScheduler, PollingStrategy};
pub use remote::{DynamicSnapshot, FetchError, RemoteFetcher, SnapshotFetcher, SnapshotStore};
pub use service::{ConfigService, PropsView};
pub use source::{ConfigSource, Resources, SourceLoader, SourceOrigin};
