use async_trait::async_trait;
use marquee_model::{Movie, MovieUpdate, NewMovie};
use uuid::Uuid;

use crate::error::Result;
use crate::query::{MovieFilter, Page};

#[async_trait]
pub trait MoviesRepository: Send + Sync {
    /// Compile `filter` onto the adapter's base query, apply `page`, execute.
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: Page,
    ) -> Result<Vec<Movie>>;
    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>>;
    async fn create_movie(
        &self,
        movie: NewMovie,
        owner: Uuid,
    ) -> Result<Movie>;
    /// Insert already-materialized records; returns how many were written.
    async fn bulk_insert(&self, movies: Vec<Movie>) -> Result<u64>;
    /// Partial update. The owner reference is never touched.
    async fn update_movie(
        &self,
        id: Uuid,
        update: &MovieUpdate,
    ) -> Result<Movie>;
    async fn delete_movie(&self, id: Uuid) -> Result<()>;
    async fn count_movies(&self) -> Result<u64>;
}
