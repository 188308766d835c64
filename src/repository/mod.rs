//! Repository layer for database operations.
//!
//! Each domain exposes a store trait implemented by [`Repository`] over
//! PostgreSQL. Services depend on the traits so they can be tested against
//! mocks. Every method that changes an item or peripheral also writes its
//! history row, inside one transaction.

pub mod history;
pub mod items;
pub mod peripherals;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

pub use history::HistoryStore;
pub use items::ItemStore;
pub use peripherals::PeripheralStore;
pub use users::UserStore;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round-trip to the database (readiness check)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
