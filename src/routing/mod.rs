//! Classification module.
//!
//! Decides whether a violation is still open:
//! - Pending (inline, external `http*`, or unspecified source)
//! - Resolved (anything else)

pub mod classification;

pub use classification::*;
