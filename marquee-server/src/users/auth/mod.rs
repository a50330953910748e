pub mod handlers;
pub mod jwt;
pub mod middleware;

use std::sync::Arc;

use marquee_core::crypto::AuthCrypto;

use crate::infra::errors::{AppError, AppResult};

// Argon2 is CPU-bound; keep it off the async workers.
pub(crate) async fn hash_password(
    crypto: &Arc<AuthCrypto>,
    password: String,
) -> AppResult<String> {
    let crypto = Arc::clone(crypto);
    tokio::task::spawn_blocking(move || crypto.hash_password(&password))
        .await
        .map_err(|err| {
            AppError::internal(format!("hashing task failed: {err}"))
        })?
        .map_err(|err| AppError::internal(err.to_string()))
}

pub(crate) async fn verify_password(
    crypto: &Arc<AuthCrypto>,
    password: String,
    password_hash: String,
) -> AppResult<bool> {
    let crypto = Arc::clone(crypto);
    tokio::task::spawn_blocking(move || {
        crypto.verify_password(&password, &password_hash)
    })
    .await
    .map_err(|err| {
        AppError::internal(format!("verification task failed: {err}"))
    })?
    .map_err(|err| AppError::internal(err.to_string()))
}
