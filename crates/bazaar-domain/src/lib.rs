//! Domain types shared across Bazaar crates.
//!
//! Pure types and transition rules with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; `infra/` only maps to and from the stored strings.

pub mod order;
pub mod payment;
pub mod user;
