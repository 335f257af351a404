//! The configuration facade.
//!
//! # Data Flow
//! ```text
//! get(key):
//!     dynamic enabled && snapshot has key → snapshot value
//!     else static chain, highest priority first
//!     else absent (get_required → MissingKey)
//!
//! props():
//!     static chain (shadowed values dropped) + one snapshot load → sorted map
//! ```
//!
//! # Design Decisions
//! - The dynamic toggle is fixed at construction
//! - Derived settings are plain structs populated once (settings.rs)
//! - props.rs is the only contract an admin surface needs

pub mod facade;
pub mod props;
pub mod settings;

pub use facade::ConfigService;
pub use props::PropsView;
pub use settings::{AdminSettings, DynamicSettings};
