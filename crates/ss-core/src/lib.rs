//! stayscore/crates/ss-core/src/lib.rs
//!
//! The central domain logic and interface definitions for StayScore:
//! models, ports, the query compiler, and the visibility resolver.

pub mod error;
pub mod filter;
pub mod location;
pub mod models;
pub mod reviews;
pub mod traits;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
