use std::{fs, path::PathBuf};
use thiserror::Error;
use url::Url;

use super::{
    constants::{
        DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_ADMIN_EMAIL,
        DEFAULT_ADMIN_NAME, DEFAULT_ADMIN_PASSWORD, DEFAULT_API_PREFIX,
        DEFAULT_MAX_CONNECTIONS, DEFAULT_PASSWORD_PEPPER, DEFAULT_PORT,
        DEFAULT_PROJECT_NAME, DEFAULT_TOKEN_KEY,
    },
    models::{
        AdminConfig, AuthConfig, Config, ConfigMetadata, CorsConfig,
        DatabaseConfig, ServerConfig,
    },
    sources::{EnvConfig, FileConfig, FileDatabaseConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["marquee.toml", "config/marquee.toml"];

/// Layered configuration: `.env`, then an optional TOML file, with
/// environment variables taking precedence over file values and defaults
/// filling whatever is left.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Read this dotenv file instead of searching for `.env`. Unlike the
    /// implicit `.env`, an explicit file must exist.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|source| {
                    ConfigLoadError::EnvFileRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                true
            }
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve configuration against an already-gathered environment.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if config_path.is_none() {
        warnings.push_with_hint(
            "No marquee.toml detected; falling back to environment variables",
            "Create marquee.toml or set MARQUEE_CONFIG_PATH",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        auth: file_auth,
        admin: file_admin,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        api_prefix: env
            .api_prefix
            .clone()
            .or(file_server.api_prefix)
            .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
        project_name: env
            .project_name
            .clone()
            .or(file_server.project_name)
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
    };

    let database = DatabaseConfig {
        url: resolve_database_url(&env, &file_database)?,
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let auth = AuthConfig {
        password_pepper: env
            .auth_password_pepper
            .clone()
            .or(file_auth.password_pepper)
            .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
        token_key: env
            .auth_token_key
            .clone()
            .or(file_auth.token_key)
            .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
        access_token_ttl_minutes: env
            .access_token_ttl_minutes
            .or(file_auth.access_token_ttl_minutes)
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
    };

    let admin = AdminConfig {
        email: env
            .admin_email
            .clone()
            .or(file_admin.email)
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        password: env
            .admin_password
            .clone()
            .or(file_admin.password)
            .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        full_name: env
            .admin_name
            .clone()
            .or(file_admin.full_name)
            .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .clone()
            .or(file_cors.allowed_origins)
            .unwrap_or_default(),
        allow_credentials: env
            .cors_allow_credentials
            .or(file_cors.allow_credentials)
            .unwrap_or(true),
    };

    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    let config = Config {
        server,
        database,
        auth,
        admin,
        cors,
        dev_mode,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(url) = env
        .database_url
        .clone()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(Some(url));
    }

    if let Some(stored_url) = file_database
        .url
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        let mut parsed = Url::parse(stored_url)
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        if parsed.password().is_none()
            && let Some(password) = non_blank(&env.database_password)
        {
            parsed
                .set_password(Some(password))
                .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
        }
        return Ok(Some(parsed.to_string()));
    }

    let host = non_blank(&env.database_host);
    let user = non_blank(&env.database_user);
    let name = non_blank(&env.database_name);

    if let (Some(host), Some(user), Some(name)) = (host, user, name) {
        let port = env.database_port.unwrap_or(5432);
        let mut url = Url::parse(&format!("postgresql://{host}:{port}/{name}"))
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        url.set_username(user).map_err(|_| {
            ConfigLoadError::InvalidDatabaseUsername {
                username: user.to_string(),
            }
        })?;
        if let Some(password) = non_blank(&env.database_password) {
            url.set_password(Some(password))
                .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
        }
        return Ok(Some(url.to_string()));
    }

    Ok(None)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid database username '{username}'")]
    InvalidDatabaseUsername { username: String },
    #[error("failed to encode database password into URL")]
    InvalidDatabasePassword,
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
    #[error("failed to load env file {path}")]
    EnvFileRead {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = ConfigLoader::new()
            .with_config_path(&missing)
            .load_with_env(EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));

        let (config, warnings) =
            compose_config(None, EnvConfig::default(), None).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.server.project_name, "IMDB");
        assert_eq!(config.auth.access_token_ttl_minutes, 11_520);
        assert_eq!(config.admin.email, "root@example.com");
        assert!(config.database.url.is_none());
        assert!(!config.dev_mode);
        assert!(
            warnings
                .items
                .iter()
                .any(|w| w.message.contains("SECRET_KEY"))
        );
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = write_config(
            r#"
            [server]
            port = 9000
            api_prefix = "/api/v2"

            [auth]
            token_key = "from-file"
            "#,
        );
        let env = EnvConfig {
            server_port: Some(9100),
            auth_token_key: Some("from-env".into()),
            ..EnvConfig::default()
        };

        let load = ConfigLoader::new()
            .with_config_path(file.path())
            .load_with_env(env)
            .unwrap();

        assert_eq!(load.config.server.port, 9100);
        assert_eq!(load.config.server.api_prefix, "/api/v2");
        assert_eq!(load.config.auth.token_key, "from-env");
        assert_eq!(
            load.config.metadata.config_path.as_deref(),
            Some(file.path())
        );
    }

    #[test]
    fn database_url_is_assembled_from_parts() {
        let env = EnvConfig {
            database_host: Some("db".into()),
            database_user: Some("imdb".into()),
            database_name: Some("catalog".into()),
            database_password: Some("s3cret".into()),
            ..EnvConfig::default()
        };
        let (config, _) = compose_config(None, env, None).unwrap();
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgresql://imdb:s3cret@db:5432/catalog")
        );
    }

    #[test]
    fn explicit_database_url_wins() {
        let env = EnvConfig {
            database_url: Some("postgres://a@b/c".into()),
            database_host: Some("ignored".into()),
            database_user: Some("ignored".into()),
            database_name: Some("ignored".into()),
            ..EnvConfig::default()
        };
        let (config, _) = compose_config(None, env, None).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("postgres://a@b/c"));
    }

    #[test]
    fn cors_origins_come_from_env() {
        let env = EnvConfig {
            cors_allowed_origins: Some(vec!["http://localhost:3000".into()]),
            ..EnvConfig::default()
        };
        let (config, _) = compose_config(None, env, None).unwrap();
        assert_eq!(config.cors.allowed_origins, ["http://localhost:3000"]);
        assert!(config.cors.allow_credentials);
    }

    #[test]
    fn guard_rails_reject_bad_values() {
        let bad_prefix = EnvConfig {
            api_prefix: Some("api/v1".into()),
            ..EnvConfig::default()
        };
        assert!(matches!(
            compose_config(None, bad_prefix, None),
            Err(ConfigLoadError::GuardRail(
                ConfigGuardRailError::InvalidApiPrefix { .. }
            ))
        ));

        let wildcard = EnvConfig {
            cors_allowed_origins: Some(vec!["*".into()]),
            ..EnvConfig::default()
        };
        assert!(matches!(
            compose_config(None, wildcard, None),
            Err(ConfigLoadError::GuardRail(
                ConfigGuardRailError::InvalidCorsConfig { .. }
            ))
        ));

        let ttl = EnvConfig {
            access_token_ttl_minutes: Some(0),
            ..EnvConfig::default()
        };
        assert!(compose_config(None, ttl, None).is_err());
    }

    #[test]
    fn token_ttl_has_an_upper_bound() {
        let file = write_config(
            r#"
            [auth]
            access_token_ttl_minutes = 10_000_000_000_000
            "#,
        );
        let err = ConfigLoader::new()
            .with_config_path(file.path())
            .load_with_env(EnvConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidTokenTtl {
                minutes: 10_000_000_000_000,
                ..
            })
        ));

        let one_year = EnvConfig {
            access_token_ttl_minutes: Some(60 * 24 * 365),
            ..EnvConfig::default()
        };
        assert!(compose_config(None, one_year, None).is_ok());
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config("[server]\nport = 9000\n");
        let err = ConfigLoader::new()
            .with_config_path(config.path())
            .with_env_file(dir.path().join("missing.env"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::EnvFileRead { .. }));
    }

    #[test]
    fn explicit_env_file_is_loaded() {
        let config = write_config("[server]\nport = 9000\n");
        let mut env_file = tempfile::NamedTempFile::new().unwrap();
        env_file
            .write_all(b"MARQUEE_LOADER_TEST_MARKER=present\n")
            .unwrap();

        let load = ConfigLoader::new()
            .with_config_path(config.path())
            .with_env_file(env_file.path())
            .load()
            .unwrap();
        assert!(load.config.metadata.env_file_loaded);
        assert_eq!(
            std::env::var("MARQUEE_LOADER_TEST_MARKER").as_deref(),
            Ok("present")
        );
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("[server\nport = ");
        let err = ConfigLoader::new()
            .with_config_path(file.path())
            .load_with_env(EnvConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }
}
