//! Data access layer (Repository pattern)
//!
//! Each repository is a narrow CRUD contract over one table. Services only
//! ever see the traits, so tests can swap in mocks or in-memory stores.

pub mod member;
pub mod session;
pub mod sketch;

pub use member::MemberRepository;
pub use session::SessionRepository;
pub use sketch::SketchRepository;

use sqlx::MySqlPool;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pool: MySqlPool,
}

impl DbPool {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close every pooled connection; called once on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl std::ops::Deref for DbPool {
    type Target = MySqlPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
