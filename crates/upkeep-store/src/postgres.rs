//! PostgreSQL backend via sqlx.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::{ConnectionError, StoreBackend};

/// PostgreSQL store backend.
///
/// A session is a single-connection pool, checked with `SELECT 1` before it
/// is handed out.
#[derive(Debug, Clone, Default)]
pub struct PgBackend;

impl PgBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreBackend for PgBackend {
    type Session = PgPool;

    async fn open(&self, uri: &str) -> Result<PgPool, ConnectionError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(uri)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        debug!("Store health check passed");

        Ok(pool)
    }

    async fn release(&self, pool: PgPool) {
        pool.close().await;
        info!("Store connection pool closed");
    }
}
