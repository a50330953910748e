use std::{fmt, sync::Arc};

use marquee_core::crypto::AuthCrypto;
use marquee_core::database::{MoviesRepository, UsersRepository};

use crate::infra::config::Config;
use crate::users::auth::jwt::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UsersRepository>,
    pub movies: Arc<dyn MoviesRepository>,
    pub auth_crypto: Arc<AuthCrypto>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("api_prefix", &self.config.server.api_prefix)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UsersRepository>,
        movies: Arc<dyn MoviesRepository>,
        auth_crypto: AuthCrypto,
    ) -> Self {
        let tokens = TokenService::new(
            &config.auth.token_key,
            config.auth.access_token_ttl_minutes,
        );
        Self {
            users,
            movies,
            auth_crypto: Arc::new(auth_crypto),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }
}
