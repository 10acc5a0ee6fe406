//! Auth types shared across Bazaar crates.
//!
//! JWT claims and validation, the refresh-token cookie, and the bearer `Identity` extractor.

pub mod cookie;
pub mod identity;
pub mod token;
