pub const DEFAULT_TOKEN_KEY: &str = "change-me-marquee-dev-token-key";
pub const DEFAULT_PASSWORD_PEPPER: &str = "change-me-marquee-dev-pepper";

pub const DEFAULT_ADMIN_EMAIL: &str = "root@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "test@123";
pub const DEFAULT_ADMIN_NAME: &str = "Admin";

pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_PROJECT_NAME: &str = "IMDB";
pub const DEFAULT_PORT: u16 = 8000;

/// 60 minutes * 24 hours * 8 days.
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 8;
/// One year.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
