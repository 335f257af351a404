//! Polling of the dynamic layer.
//!
//! # Data Flow
//! ```text
//! start():
//!     sync_init? → fetch inline → publish, or return FetchError to the caller
//!     spawn loop:
//!         sleep(interval) or shutdown
//!         → fetch
//!         → Ok: publish (unless stopped meanwhile)
//!         → Err: log, keep previous snapshot, wait for next tick
//! ```
//!
//! # Design Decisions
//! - At most one fetch in flight; the next tick is armed after it completes
//! - No immediate retry and no backoff on failure
//! - Stopping never aborts a fetch, it only prevents publication

pub mod scheduler;
pub mod strategy;

pub use scheduler::PollingScheduler;
pub use strategy::PollingStrategy;
