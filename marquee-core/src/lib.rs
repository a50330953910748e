//! # Marquee Core
//!
//! Domain logic for the Marquee movie catalog.
//!
//! - [`query`]: compiles URL filter parameters into predicates and conjoins
//!   them onto a storage-specific query handle (SQL builder or in-memory).
//! - [`authz`]: the administrator gate and the ownership check guarding
//!   movie mutations.
//! - [`crypto`]: Argon2id password hashing with a server-side pepper.
//! - [`database`]: repository ports with PostgreSQL and in-memory adapters.
//! - [`seed`]: bootstrap administrator and fixture loading.
//!
//! ```
//! use marquee_core::query::{MovieFilter, MovieQuery, Page, PgMovieQuery};
//!
//! let filter = MovieFilter {
//!     imdb_score_gte: Some(9.0),
//!     ..MovieFilter::default()
//! };
//! let sql = filter
//!     .apply(PgMovieQuery::new())
//!     .paginate(Page::default())
//!     .into_builder();
//! assert!(sql.sql().contains("imdb_score >= $1"));
//! ```

pub mod authz;
pub mod crypto;
pub mod database;
pub mod error;
pub mod query;
pub mod seed;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use error::{DomainError, Result};
