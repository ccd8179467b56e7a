//! Environment-configured MySQL connection pool.
//!
//! One pool per process, resolved from `DB_HOST`/`BACKEND_SERVICE`,
//! `DB_PORT`/`BACKEND_PORT`, `MYSQL_USER`, `MYSQL_PASSWORD` and
//! `MYSQL_DATABASE`, with fixed capacity and an unbounded wait queue.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;

pub use config::{Config, DbConfig};
pub use db::{shared_pool, DbPool};
pub use error::AppError;
pub use handlers::AppState;

use axum::routing::get;
use handlers::http;

/// Build the probe router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", get(http::health))
        .route("/health/db", get(http::db_health))
        .route("/pool", get(http::pool_status))
        .with_state(state)
}
