//! Connection pool wrapper.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::DbError;

/// Thin wrapper around a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(DbError::Connect)?;
        Ok(Self { pool })
    }

    /// The underlying sqlx pool.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.pool
    }
}

impl From<PgPool> for DbPool {
    fn from(pool: PgPool) -> Self {
        Self { pool }
    }
}
