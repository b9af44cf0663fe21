//! Metrics aggregation module.
//!
//! Summary counts and per-directive breakdowns over the whole collection,
//! recomputed on every request.

pub mod aggregate;

pub use aggregate::*;
