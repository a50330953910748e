use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use marquee_core::{
    crypto::AuthCrypto,
    database::{MemoryStore, MoviesRepository, UsersRepository},
};
use marquee_model::{Movie, NewMovie, NewUser, User};
use marquee_server::{
    AppState, create_app,
    infra::config::{
        AdminConfig, AuthConfig, Config, ConfigMetadata, CorsConfig,
        DatabaseConfig, ServerConfig,
    },
};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

// Code is used by test modules, but not in this scope
#[allow(unused)]
#[derive(Debug)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

#[allow(unused)]
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            api_prefix: "/api/v1".into(),
            project_name: "IMDB".into(),
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        auth: AuthConfig {
            password_pepper: "test-pepper".into(),
            token_key: "test-token-key".into(),
            access_token_ttl_minutes: 60,
        },
        admin: AdminConfig {
            email: "root@example.com".into(),
            password: "test@123".into(),
            full_name: "Admin".into(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
            allow_credentials: true,
        },
        dev_mode: true,
        metadata: ConfigMetadata::default(),
    }
}

#[allow(unused)]
pub fn build_test_app() -> TestApp {
    let store = MemoryStore::new();
    let crypto = AuthCrypto::insecure_for_tests("test-pepper")
        .expect("test crypto parameters");
    let state = AppState::new(
        test_config(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        crypto,
    );
    TestApp {
        router: create_app(state.clone()),
        state,
        store,
    }
}

#[allow(unused)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Create an account directly in the store with [`PASSWORD`].
    pub async fn create_user(
        &self,
        email: &str,
        admin: bool,
        active: bool,
    ) -> User {
        let hash = self
            .state
            .auth_crypto
            .hash_password(PASSWORD)
            .expect("hash password");
        let mut new = NewUser::regular("Test User", email);
        new.is_admin = admin;
        new.is_active = active;
        self.store.create_user(&new, &hash).await.expect("create user")
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user.id).expect("issue token")
    }

    pub async fn create_movie(
        &self,
        owner: &User,
        name: &str,
        director: &str,
        imdb_score: f64,
        genre: &[&str],
    ) -> Movie {
        self.store
            .create_movie(
                NewMovie {
                    name: name.into(),
                    director: director.into(),
                    popularity: Some(imdb_score * 10.0),
                    imdb_score,
                    genre: genre.iter().map(|g| g.to_string()).collect(),
                },
                owner.id,
            )
            .await
            .expect("create movie")
    }
}

#[allow(unused)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder =
            builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("build request")
}

#[allow(unused)]
pub fn empty_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder =
            builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("build request")
}

#[allow(unused)]
pub fn form_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("build request")
}

#[allow(unused)]
pub async fn parse_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// The `message` field of the error envelope.
#[allow(unused)]
pub async fn error_message(response: Response<Body>) -> String {
    let body = parse_json(response).await;
    body["error"]["message"]
        .as_str()
        .expect("error envelope")
        .to_string()
}
