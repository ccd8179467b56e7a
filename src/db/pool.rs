//! MySQL connection pool.
//!
//! The pool is created lazily: construction never opens a connection, so an
//! unreachable host or bad credentials surface on the first acquisition.
//! Acquisitions beyond `connection_limit` wait in the pool's waiter queue,
//! which has no maximum depth (`queue_limit` of 0).

use once_cell::sync::OnceCell;
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigLoadError, DbConfig};

pub type DbPool = sqlx::MySqlPool;

static SHARED: OnceCell<DbPool> = OnceCell::new();

/// Errors from the process-wide pool accessors.
#[derive(Error, Debug)]
pub enum PoolInitError {
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    #[error("the shared pool must be accessed from within a Tokio runtime")]
    NoRuntime,
}

/// Build a new pool from `config`. Must be called inside a tokio runtime.
pub fn create_pool(config: &DbConfig) -> DbPool {
    info!(
        host = %config.host,
        port = config.port,
        user = %config.user,
        database = %config.database,
        connection_limit = config.connection_limit,
        queue_limit = config.queue_limit,
        "creating mysql pool"
    );
    MySqlPoolOptions::new()
        .max_connections(config.connection_limit)
        .connect_lazy_with(config.connect_options())
}

fn ensure_runtime() -> Result<(), PoolInitError> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| PoolInitError::NoRuntime)
}

/// Install the process-wide pool built from `config`.
///
/// Only the first call constructs a pool; later calls return that same
/// instance and ignore their argument. Returns [`PoolInitError::NoRuntime`]
/// outside a tokio runtime.
pub fn init_shared_pool(config: &DbConfig) -> Result<&'static DbPool, PoolInitError> {
    ensure_runtime()?;
    Ok(SHARED.get_or_init(|| create_pool(config)))
}

/// The process-wide pool. If [`init_shared_pool`] has not run yet, `.env` is
/// loaded and the settings are resolved from the environment.
///
/// Fails with [`PoolInitError::NoRuntime`] outside a tokio runtime, and with
/// [`PoolInitError::Config`] when the port does not coerce to a valid port
/// number. Connectivity problems are not checked here; they surface on the
/// first acquisition.
pub fn shared_pool() -> Result<&'static DbPool, PoolInitError> {
    ensure_runtime()?;
    SHARED.get_or_try_init(|| -> Result<DbPool, PoolInitError> {
        dotenvy::dotenv().ok();
        let config = DbConfig::from_env()?;
        Ok(create_pool(&config))
    })
}

/// Acquire a connection and run `SELECT 1` on it.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}
