//! HTTP handlers: liveness, database readiness and pool status.

pub mod http;

pub use http::AppState;
