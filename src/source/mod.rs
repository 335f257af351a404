//! Configuration source loading.
//!
//! # Data Flow
//! ```text
//! source name
//!     → "file:<path>"   → local filesystem
//!     → anything else   → bundled resources (embedded, then resource dirs)
//!     → format.rs (TOML/JSON → flat ordered key/value pairs)
//!     → ConfigSource (raw, unresolved)
//! ```
//!
//! # Design Decisions
//! - No caching: every load re-reads from its origin
//! - Nested tables flatten to dotted keys, values are stringified
//! - Arrays collapse into one comma-separated value so overlays replace lists whole

pub mod format;
pub mod loader;

pub use format::{PropertyMap, SourceFormat};
pub use loader::{ConfigSource, Resources, SourceLoader, SourceOrigin, FILE_MARKER};
