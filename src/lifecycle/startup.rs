//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the static chain from the base source
//! - Read the dynamic layer settings from it
//! - Start polling (blocking on the first fetch when configured)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, never concurrently

use crate::error::Result;
use crate::layer::LayerResolver;
use crate::observability::metrics::SharedMetrics;
use crate::service::ConfigService;

/// Resolve `base_name` and assemble the service around it.
pub async fn bootstrap(
    resolver: &LayerResolver,
    base_name: &str,
    metrics: SharedMetrics,
) -> Result<ConfigService> {
    tracing::info!(base = base_name, "Resolving configuration");
    let chain = resolver.resolve(base_name)?;
    let service = ConfigService::from_resolved(chain, metrics).await?;
    tracing::info!(
        keys = service.keys().len(),
        dynamic = service.is_dynamic_enabled(),
        "Configuration ready"
    );
    Ok(service)
}
