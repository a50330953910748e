//! Persistence: repository ports and their PostgreSQL and in-memory adapters.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::MemoryStore;
pub use ports::{MoviesRepository, UsersRepository};
pub use postgres::{
    PostgresDatabase, PostgresMoviesRepository, PostgresUsersRepository,
};
