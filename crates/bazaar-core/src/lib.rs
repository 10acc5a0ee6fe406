//! Cross-cutting plumbing shared by Bazaar services.
//!
//! Config loading, tracing init, request ids, health probes and serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
