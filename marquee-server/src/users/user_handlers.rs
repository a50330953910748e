use axum::{Extension, Json, extract::State, http::StatusCode};
use marquee_core::error::DomainError;
use marquee_model::{
    AccessToken, NewUser, RegisterRequest, ResetPasswordRequest, User,
};
use serde_json::{Value, json};
use tracing::info;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    extract::AppJson,
};
use crate::users::auth::{hash_password, verify_password};

const DUPLICATE_EMAIL: &str =
    "The user with this email already exists in the system.";

/// Self-registration. New accounts are active and never administrators.
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccessToken>)> {
    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::unprocessable(
            "A valid email address is required",
        ));
    }

    if state.users.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request(DUPLICATE_EMAIL));
    }

    let hash = hash_password(&state.auth_crypto, request.password).await?;
    let user = state
        .users
        .create_user(&NewUser::regular(request.full_name, email), &hash)
        .await
        .map_err(|err| match err {
            DomainError::Conflict(_) => AppError::bad_request(DUPLICATE_EMAIL),
            other => other.into(),
        })?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|err| {
            AppError::internal(format!("failed to issue token: {err}"))
        })?;

    info!(target: "user.auth", user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(AccessToken::bearer(token))))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let stored_hash = state
        .users
        .get_password_hash(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&state.auth_crypto, request.old_password, stored_hash)
        .await?
    {
        return Err(AppError::bad_request("Incorrect password"));
    }

    let hash = hash_password(&state.auth_crypto, request.new_password).await?;
    state.users.update_password(user.id, &hash).await?;

    info!(target: "user.auth", user_id = %user.id, "password reset");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "msg": "Password updated successfully" })),
    ))
}

pub async fn current_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
