//! Report ingestion pipeline.
//!
//! Coordinates one submission:
//! - Payload decoding
//! - Schema validation
//! - Durable append

pub mod context;
pub mod ingestion;

pub use context::*;
pub use ingestion::*;
