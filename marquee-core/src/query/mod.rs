//! Movie query system: filter compilation and the query handles it targets.

pub mod filter;
pub mod memory;
pub mod pagination;
pub mod postgres;

pub use filter::{Comparison, MovieFilter, MoviePredicate, MovieQuery};
pub use memory::MemoryMovieQuery;
pub use pagination::Page;
pub use postgres::PgMovieQuery;
