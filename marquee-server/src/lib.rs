//! # Marquee Server
//!
//! Axum HTTP API over the Marquee movie catalog: password login issuing
//! bearer tokens, self-registration, and movie listing with URL filters.
//! Movie mutations are restricted to active administrators and, for
//! update and delete, to the movie's owner.

pub mod infra;
pub mod movies;
pub mod routes;
pub mod users;

use axum::{Router, http::HeaderValue};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub use infra::app_state::AppState;

use infra::config::CorsConfig;

/// Build the complete application router with middleware applied.
pub fn create_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors);

    let mut app = routes::create_api_router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http());
    if let Some(cors) = cors {
        app = app.layer(cors);
    }
    app
}

/// CORS is only mounted when at least one origin is configured.
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if cors.allowed_origins.is_empty() {
        return None;
    }

    let allow_origin = if cors.is_wildcard_included() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let mut layer = CorsLayer::new().allow_origin(allow_origin);
    layer = if cors.allow_credentials {
        // Credentials rule out `*` for methods and headers.
        layer
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any())
    };
    Some(layer)
}
