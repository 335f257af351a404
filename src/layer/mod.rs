//! Static layer resolution.
//!
//! # Data Flow
//! ```text
//! base source
//!     → read account type → load "<prefix>-<type>.<ext>" overlay
//!     → read include list  → load each include in order
//!     → substitution.rs (resolve ${...} against the merged result)
//!     → chain.rs (immutable ConfigLayer chain, highest priority first)
//! ```
//!
//! # Design Decisions
//! - Priority: last include > earlier includes > overlay > base
//! - Includes named inside includes are not followed
//! - The chain is built once and never mutated; callers only see its head

pub mod chain;
pub mod resolver;
pub mod substitution;

pub use chain::ConfigLayer;
pub use resolver::{LayerResolver, ResolverOptions};
pub use substitution::{EnvSource, ProcessEnv};
