//! Test utilities for Bazaar services.
//!
//! `MockAuth` mints bearer tokens; `body` reads JSON out of axum responses.
//! Use from dev-dependencies only.

pub mod auth;
pub mod body;
