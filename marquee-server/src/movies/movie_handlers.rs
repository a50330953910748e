use axum::{Extension, Json, extract::State, http::StatusCode};
use marquee_core::{
    DomainError,
    authz::can_mutate_movie,
    query::{MovieFilter, Page},
};
use marquee_model::{Movie, MovieUpdate, NewMovie, User};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    Page::DEFAULT_LIMIT
}

fn movie_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Movie not found for provided id={id}"))
}

pub async fn list_movies(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageParams>,
    AppQuery(filter): AppQuery<MovieFilter>,
) -> AppResult<Json<Vec<Movie>>> {
    let page = Page::new(params.offset, params.limit)?;
    let movies = state.movies.list_movies(&filter, page).await?;
    Ok(Json(movies))
}

pub async fn get_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Movie>> {
    state
        .movies
        .get_movie(id)
        .await?
        .map(Json)
        .ok_or_else(|| movie_not_found(id))
}

pub async fn create_movie(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(movie): AppJson<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let created = state
        .movies
        .create_movie(movie.with_derived_popularity(), user.id)
        .await?;

    info!(
        target: "movie.admin",
        movie_id = %created.id,
        user_id = %user.id,
        "movie created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Load the movie and check the caller owns it.
async fn owned_movie(
    state: &AppState,
    user: &User,
    id: Uuid,
) -> AppResult<Movie> {
    let movie = state
        .movies
        .get_movie(id)
        .await?
        .ok_or_else(|| movie_not_found(id))?;

    if !can_mutate_movie(user, &movie) {
        info!(
            target: "movie.admin",
            movie_id = %id,
            user_id = %user.id,
            "mutation denied for non-owner"
        );
        return Err(AppError::bad_request("Not enough permissions"));
    }
    Ok(movie)
}

pub async fn update_movie(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<MovieUpdate>,
) -> AppResult<Json<Movie>> {
    owned_movie(&state, &user, id).await?;

    let updated = state
        .movies
        .update_movie(id, &update)
        .await
        .map_err(|err| match err {
            DomainError::NotFound(_) => movie_not_found(id),
            other => other.into(),
        })?;

    info!(
        target: "movie.admin",
        movie_id = %id,
        user_id = %user.id,
        "movie updated"
    );
    Ok(Json(updated))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    owned_movie(&state, &user, id).await?;

    state
        .movies
        .delete_movie(id)
        .await
        .map_err(|err| match err {
            DomainError::NotFound(_) => movie_not_found(id),
            other => other.into(),
        })?;

    info!(
        target: "movie.admin",
        movie_id = %id,
        user_id = %user.id,
        "movie deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
