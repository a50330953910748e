use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    infra::app_state::AppState,
    movies::movie_handlers,
    users::{
        auth::{self, middleware::{admin_middleware, auth_middleware}},
        user_handlers,
    },
};

pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public endpoints
        .route("/login", post(auth::handlers::login))
        .route("/users", post(user_handlers::register))
        .merge(create_protected_routes(state.clone()))
        .merge(create_admin_routes(state))
}

/// Routes that require a valid bearer token.
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/me", get(user_handlers::current_user))
        .route("/users/reset-password", post(user_handlers::reset_password))
        .route("/movies", get(movie_handlers::list_movies))
        .route("/movies/{id}", get(movie_handlers::get_movie))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Movie mutations: authenticated, then gated on administrator status.
fn create_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/movies", post(movie_handlers::create_movie))
        .route(
            "/movies/{id}",
            axum::routing::patch(movie_handlers::update_movie)
                .delete(movie_handlers::delete_movie),
        )
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}
