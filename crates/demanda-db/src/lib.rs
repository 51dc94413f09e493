//! PostgreSQL persistence for the demand lifecycle engine.
//!
//! Provides the connection pool, embedded migrations, row models for the
//! demand tables, and `Pg*Store` implementations of the store traits defined
//! in `demanda-core`. The schema carries the write-time scheduling
//! guarantee: a partial unique index over live bookings makes a concurrent
//! double-booking impossible to commit.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod stores;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use models::{DemandAuditRow, DemandRow, MemberRow};
pub use pool::DbPool;
pub use stores::{PgAuditStore, PgDemandStore, PgMemberStore};
