//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load base → overlay → includes → resolve → read dynamic settings
//!     → start polling (sync first fetch if configured) → ConfigService
//!
//! Shutdown (shutdown.rs):
//!     stop() → scheduler stops ticking → late fetch results discarded
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary calls stop()
//! ```
//!
//! # Design Decisions
//! - Fail fast: static resolution errors abort startup
//! - One explicit ConfigService per process, passed by reference

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::bootstrap;
