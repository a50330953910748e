use std::path::PathBuf;

use marquee_core::seed::AdminAccount;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub cors: CorsConfig,
    /// Allows running without a database on the in-memory store.
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the versioned API, e.g. `/api/v1`.
    pub api_prefix: String,
    pub project_name: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub password_pepper: String,
    pub token_key: String,
    pub access_token_ttl_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("password_pepper", &"<redacted>")
            .field("token_key", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .finish()
    }
}

/// Bootstrap administrator created by `db seed` and in dev mode.
#[derive(Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl AdminConfig {
    pub fn account(&self) -> AdminAccount {
        AdminAccount {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
