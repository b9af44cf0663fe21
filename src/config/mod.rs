//! Configuration module.
//!
//! Server settings loaded from environment variables.

pub mod settings;

pub use settings::*;
