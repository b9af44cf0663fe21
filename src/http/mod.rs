//! HTTP surface.
//!
//! JSON over HTTP on axum. Handlers are thin: they build a request context,
//! call the pipeline or the store, and map results to status codes.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::*;
