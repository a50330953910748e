//! Repository ports implemented by the storage adapters.

pub mod movies;
pub mod users;

pub use movies::MoviesRepository;
pub use users::UsersRepository;
