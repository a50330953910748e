use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use marquee_core::authz::can_access_admin_endpoints;
use marquee_model::User;
use tracing::{debug, warn};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppError;

/// Resolve the bearer token to a [`User`] and attach it to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)?;

    let claims = state.tokens.validate(token).map_err(|err| {
        debug!(target: "user.auth", error = %err, "rejected access token");
        AppError::forbidden("Could not validate credentials")
    })?;

    let user = state
        .users
        .get_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Gate for movie mutations. Must run after [`auth_middleware`].
pub async fn admin_middleware(
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

    if !can_access_admin_endpoints(user) {
        warn!(
            target: "movie.admin",
            user_id = %user.id,
            "denied admin endpoint"
        );
        return Err(AppError::unauthorized("Not enough permissions"));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<&str, AppError> {
    let not_authenticated = || AppError::unauthorized("Not authenticated");

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(not_authenticated)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or_else(not_authenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(not_authenticated());
    }

    Ok(token.trim())
}
