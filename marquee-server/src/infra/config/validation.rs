use axum::http::HeaderValue;
use thiserror::Error;

use super::constants::{
    DEFAULT_ADMIN_PASSWORD, DEFAULT_PASSWORD_PEPPER, DEFAULT_TOKEN_KEY,
    MAX_ACCESS_TOKEN_TTL_MINUTES,
};
use super::models::{Config, CorsConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
    #[error("API prefix '{prefix}' must start with '/' and not end with '/'")]
    InvalidApiPrefix { prefix: String },
    #[error(
        "access token lifetime must be between 1 and {max} minutes, got {minutes}"
    )]
    InvalidTokenTtl { minutes: i64, max: i64 },
    #[error("invalid CORS configuration: {reason}")]
    InvalidCorsConfig { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let prefix = &config.server.api_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        return Err(ConfigGuardRailError::InvalidApiPrefix {
            prefix: prefix.clone(),
        });
    }

    let ttl = config.auth.access_token_ttl_minutes;
    if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&ttl) {
        return Err(ConfigGuardRailError::InvalidTokenTtl {
            minutes: ttl,
            max: MAX_ACCESS_TOKEN_TTL_MINUTES,
        });
    }

    for (field, value) in [
        ("SECRET_KEY", &config.auth.token_key),
        ("AUTH_PASSWORD_PEPPER", &config.auth.password_pepper),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigGuardRailError::WeakSecret {
                field,
                reason: "must not be empty".into(),
            });
        }
    }

    if config.auth.token_key == DEFAULT_TOKEN_KEY {
        warnings.push_with_hint(
            "SECRET_KEY is using the built-in development value",
            "Set SECRET_KEY to a long random string before exposing the server",
        );
    }
    if config.auth.password_pepper == DEFAULT_PASSWORD_PEPPER {
        warnings.push_with_hint(
            "AUTH_PASSWORD_PEPPER is using the built-in development value",
            "Set AUTH_PASSWORD_PEPPER; changing it later invalidates stored passwords",
        );
    }
    if config.admin.password == DEFAULT_ADMIN_PASSWORD {
        warnings.push("ADMIN_PASSWORD is using the built-in default");
    }

    validate_cors(&config.cors)?;

    if config.database.url.is_none() {
        if config.dev_mode {
            warnings.push_with_hint(
                "No database configured; using the in-memory store",
                "Data is lost on restart. Set DATABASE_URL to persist it",
            );
        } else {
            warnings.push_with_hint(
                "No database configured",
                "Set DATABASE_URL or DATABASE_HOST/USER/NAME, or enable DEV_MODE",
            );
        }
    }

    Ok(warnings)
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigGuardRailError> {
    if cors.allow_credentials && cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::InvalidCorsConfig {
            reason: "wildcard origin cannot be combined with credentials"
                .into(),
        });
    }

    for origin in cors.allowed_origins.iter().filter(|o| *o != "*") {
        HeaderValue::from_str(origin).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!(
                    "origin '{origin}' is not a valid header value"
                ),
            }
        })?;
    }
    Ok(())
}
