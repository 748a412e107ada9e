//! stayscore/crates/ss-api/src/lib.rs
//!
//! The HTTP surface of StayScore: handlers, route registration, and the
//! middleware stack. Everything else lives behind the ss-core ports.

pub mod handlers;
pub mod middleware;

pub use handlers::{routes, AppState};
