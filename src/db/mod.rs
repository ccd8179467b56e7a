//! Database layer: the process-wide MySQL connection pool.

mod pool;

pub use pool::{create_pool, init_shared_pool, ping, shared_pool, DbPool, PoolInitError};
