//! Error types for the database layer.

use thiserror::Error;

/// Errors raised by pool management and migrations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Could not establish the connection pool.
    #[error("failed to connect to database")]
    Connect(#[source] sqlx::Error),

    /// A migration failed to apply.
    #[error("migration failed")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// Any other database failure.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Convenience Result type for the database layer.
pub type Result<T> = std::result::Result<T, DbError>;
