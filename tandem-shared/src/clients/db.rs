use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::errors::{StoreError, StoreResult};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str, max_size: u32) -> StoreResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(2.min(max_size)))
        .test_on_check_out(true)
        .build(manager)
        .map_err(|e| StoreError::Backend(format!("failed to create database pool: {e}")))?;

    tracing::info!(max_size, "database connection pool created");
    Ok(pool)
}
