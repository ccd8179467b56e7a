//! HTTP handlers built on the shared pool.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::json;

use crate::config::DbConfig;
use crate::db::{self, DbPool};
use crate::error::AppResult;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub queue_limit: u32,
}

impl AppState {
    /// Wrap `db`, recording the queue limit it was configured with.
    pub fn new(db: DbPool, config: &DbConfig) -> Self {
        Self {
            db,
            queue_limit: config.queue_limit,
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }
}

/// Snapshot of the pool's occupancy and limits.
#[derive(Debug, Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
    pub connection_limit: u32,
    pub queue_limit: u32,
}

/// GET /health: liveness probe. Never touches the database.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "dbpool" })),
    )
}

/// GET /health/db: acquire a connection and run `SELECT 1`.
pub async fn db_health(
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    db::ping(state.db()).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// GET /pool: current size, idle count and limits.
pub async fn pool_status(State(state): State<AppState>) -> Json<PoolStatus> {
    let pool = state.db();
    Json(PoolStatus {
        size: pool.size(),
        idle: pool.num_idle(),
        connection_limit: pool.options().get_max_connections(),
        queue_limit: state.queue_limit,
    })
}
