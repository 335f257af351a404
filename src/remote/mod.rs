//! Remote (dynamic) configuration layer.
//!
//! # Data Flow
//! ```text
//! PollingScheduler tick
//!     → fetcher.rs (HTTP GET, JSON object → flat PropertyMap)
//!     → success: snapshot.rs publishes a new DynamicSnapshot (atomic swap)
//!     → failure: FetchError { Network | Parse }, previous snapshot kept
//! ```
//!
//! # Design Decisions
//! - Fetches are stateless; each attempt is independent
//! - Snapshots are immutable and numbered; readers never see a partial one
//! - No history: a replaced snapshot is freed once unreferenced

pub mod fetcher;
pub mod snapshot;

pub use fetcher::{FetchError, FetchResult, RemoteFetcher, SnapshotFetcher, DEFAULT_FETCH_TIMEOUT};
pub use snapshot::{DynamicSnapshot, SnapshotStore};
