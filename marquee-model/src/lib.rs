//! Core data model definitions shared across Marquee crates.

pub mod auth;
pub mod movie;
pub mod user;

pub use auth::{AccessToken, LoginForm, TokenType};
pub use movie::{Movie, MovieUpdate, NewMovie};
pub use user::{
    NewUser, RegisterRequest, ResetPasswordRequest, User, UserUpdate,
};
