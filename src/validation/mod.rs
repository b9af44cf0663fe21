//! Report schema validation.
//!
//! Turns an untrusted JSON payload into a typed [`CspReport`]:
//! - Byte payload decoding (`application/csp-report`, `application/json`)
//! - Required/optional field and type checks
//! - `document-uri` URL check

pub mod decode;
pub mod schema;

pub use decode::*;
pub use schema::*;
