//! PostgreSQL adapters.

pub mod movies;
pub mod users;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::Result;

pub use movies::PostgresMoviesRepository;
pub use users::PostgresUsersRepository;

/// Connection pool plus the repositories that share it.
#[derive(Clone, Debug)]
pub struct PostgresDatabase {
    pool: PgPool,
    users: PostgresUsersRepository,
    movies: PostgresMoviesRepository,
}

impl PostgresDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(url)
            .await?;

        info!(max_connections, "connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: PostgresUsersRepository::new(pool.clone()),
            movies: PostgresMoviesRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn users(&self) -> &PostgresUsersRepository {
        &self.users
    }

    pub fn movies(&self) -> &PostgresMoviesRepository {
        &self.movies
    }

    /// Apply pending migrations.
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await?;
        info!("database schema is up to date");
        Ok(())
    }
}
