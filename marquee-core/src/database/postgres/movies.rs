use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{Movie, MovieUpdate, NewMovie};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::ports::movies::MoviesRepository;
use crate::error::{DomainError, Result};
use crate::query::postgres::MOVIE_COLUMNS;
use crate::query::{MovieFilter, MovieQuery, Page, PgMovieQuery};

// Nine binds per row keeps each statement well under the 65535 parameter cap.
const INSERT_BATCH_SIZE: usize = 1000;

#[derive(Debug, FromRow)]
struct MovieRow {
    id: Uuid,
    name: String,
    director: String,
    popularity: Option<f64>,
    imdb_score: f64,
    genre: Vec<String>,
    created_by_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            name: row.name,
            director: row.director,
            popularity: row.popularity,
            imdb_score: row.imdb_score,
            genre: row.genre,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed implementation of the `MoviesRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresMoviesRepository {
    pool: PgPool,
}

impl PostgresMoviesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Build the statement `list_movies` would run, without executing it.
    pub fn build_list_query(
        filter: &MovieFilter,
        page: Page,
    ) -> QueryBuilder<'static, Postgres> {
        filter
            .apply(PgMovieQuery::new())
            .paginate(page)
            .into_builder()
    }
}

#[async_trait]
impl MoviesRepository for PostgresMoviesRepository {
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: Page,
    ) -> Result<Vec<Movie>> {
        let mut qb = Self::build_list_query(filter, page);
        debug!(
            predicates = filter.predicate_count(),
            offset = page.offset,
            limit = page.limit,
            "listing movies"
        );
        let rows: Vec<MovieRow> =
            qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        let row: Option<MovieRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Movie::from))
    }

    async fn create_movie(
        &self,
        movie: NewMovie,
        owner: Uuid,
    ) -> Result<Movie> {
        let record = Movie::from_new(movie, owner);
        let sql = format!(
            "INSERT INTO movies ({MOVIE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {MOVIE_COLUMNS}"
        );
        let row: MovieRow = sqlx::query_as(&sql)
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.director)
            .bind(record.popularity)
            .bind(record.imdb_score)
            .bind(&record.genre)
            .bind(record.created_by_id)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(self.pool())
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_err) if db_err.is_foreign_key_violation() => {
                    DomainError::NotFound(format!("owner {owner}"))
                }
                _ => DomainError::Database(e),
            })?;

        info!(movie_id = %row.id, owner = %owner, "created movie");
        Ok(row.into())
    }

    async fn bulk_insert(&self, movies: Vec<Movie>) -> Result<u64> {
        if movies.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool().begin().await?;
        let mut inserted = 0u64;
        for chunk in movies.chunks(INSERT_BATCH_SIZE) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                format!("INSERT INTO movies ({MOVIE_COLUMNS}) "),
            );
            qb.push_values(chunk, |mut row, movie| {
                row.push_bind(movie.id)
                    .push_bind(movie.name.clone())
                    .push_bind(movie.director.clone())
                    .push_bind(movie.popularity)
                    .push_bind(movie.imdb_score)
                    .push_bind(movie.genre.clone())
                    .push_bind(movie.created_by_id)
                    .push_bind(movie.created_at)
                    .push_bind(movie.updated_at);
            });
            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        info!(count = inserted, "bulk inserted movies");
        Ok(inserted)
    }

    async fn update_movie(
        &self,
        id: Uuid,
        update: &MovieUpdate,
    ) -> Result<Movie> {
        let sql = format!(
            "UPDATE movies SET \
             name = COALESCE($2, name), \
             director = COALESCE($3, director), \
             popularity = COALESCE($4, popularity), \
             imdb_score = COALESCE($5, imdb_score), \
             genre = COALESCE($6, genre), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {MOVIE_COLUMNS}"
        );
        let row: Option<MovieRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.director.as_deref())
            .bind(update.popularity)
            .bind(update.imdb_score)
            .bind(update.genre.clone())
            .fetch_optional(self.pool())
            .await?;

        let movie = row
            .map(Movie::from)
            .ok_or_else(|| DomainError::NotFound(format!("movie {id}")))?;
        info!(movie_id = %id, "updated movie");
        Ok(movie)
    }

    async fn delete_movie(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("movie {id}")));
        }
        info!(movie_id = %id, "deleted movie");
        Ok(())
    }

    async fn count_movies(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(self.pool())
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_orders_and_paginates_after_predicates() {
        let filter = MovieFilter {
            director: Some("nolan".into()),
            imdb_score_gte: Some(8.0),
            ..MovieFilter::default()
        };
        let qb = PostgresMoviesRepository::build_list_query(
            &filter,
            Page::new(10, 5).expect("valid page"),
        );
        let sql = qb.sql();

        assert!(sql.starts_with("SELECT id, name, director"));
        assert!(sql.contains("director ILIKE $1"));
        assert!(sql.contains("imdb_score >= $2"));
        assert!(
            sql.ends_with(" ORDER BY created_at ASC, id ASC LIMIT $3 OFFSET $4")
        );
    }

    #[test]
    fn empty_filter_lists_everything_in_order() {
        let qb = PostgresMoviesRepository::build_list_query(
            &MovieFilter::default(),
            Page::default(),
        );
        assert_eq!(
            qb.sql(),
            format!(
                "SELECT {MOVIE_COLUMNS} FROM movies WHERE TRUE \
                 ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
            )
        );
    }
}
