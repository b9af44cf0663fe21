//! Storage module.
//!
//! Append-only report collection backed by a single JSON document that is
//! rewritten in full on every accepted report.

pub mod models;
pub mod store;

pub use models::*;
pub use store::*;
