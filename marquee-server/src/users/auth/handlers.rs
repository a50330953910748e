use axum::{Json, extract::State};
use marquee_model::{AccessToken, LoginForm};
use tracing::info;

use super::verify_password;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    extract::AppForm,
};

/// OAuth2 password flow: `username` carries the email.
pub async fn login(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginForm>,
) -> AppResult<Json<AccessToken>> {
    let incorrect = || AppError::bad_request("Incorrect email or password");

    let user = state
        .users
        .get_user_by_email(&form.username)
        .await?
        .ok_or_else(incorrect)?;
    let stored_hash = state
        .users
        .get_password_hash(user.id)
        .await?
        .ok_or_else(incorrect)?;

    if !verify_password(&state.auth_crypto, form.password, stored_hash).await? {
        info!(target: "user.auth", user_id = %user.id, "failed login");
        return Err(incorrect());
    }
    if !user.is_active {
        return Err(AppError::forbidden("Inactive User"));
    }

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|err| {
            AppError::internal(format!("failed to issue token: {err}"))
        })?;

    info!(target: "user.auth", user_id = %user.id, "user logged in");
    Ok(Json(AccessToken::bearer(token)))
}
