use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use marquee_core::{
    crypto::AuthCrypto,
    database::{
        MemoryStore, MoviesRepository, PostgresDatabase, UsersRepository,
    },
    seed,
};
use marquee_server::{
    AppState, create_app,
    infra::config::{Config, ConfigLoad, ConfigLoader},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FIXTURE: &str = "fixtures/imdb.json";

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "marquee-server")]
#[command(
    about = "Movie catalog API with filtering and owner-scoped administration"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a marquee.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dotenv file to load instead of `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
    /// Create the bootstrap administrator and load the movie fixture
    Seed {
        /// JSON fixture to load when the catalog is empty
        #[arg(long, default_value = DEFAULT_FIXTURE)]
        fixtures: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_runtime_config(&cli.serve)?;

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(&config).await,
        Some(Command::Db(DbCommand::Seed { fixtures })) => {
            run_db_seed(&config, &fixtures).await
        }
        None => run_server(config).await,
    }
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        match &args.env_file {
            Some(path) => info!(path = %path.display(), "loaded env file"),
            None => info!("loaded .env file"),
        }
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(
                message = %warning.message,
                hint = %hint,
                "configuration warning"
            ),
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(config)
}

async fn connect_postgres(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let Some(url) = config.database.url.as_deref() else {
        bail!("no database configured; set DATABASE_URL");
    };
    let db = PostgresDatabase::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    db.initialize_schema()
        .await
        .context("database migration failed")?;
    Ok(db)
}

fn auth_crypto(config: &Config) -> anyhow::Result<AuthCrypto> {
    AuthCrypto::new(&config.auth.password_pepper)
        .context("failed to initialise password hashing")
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    connect_postgres(config).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_db_seed(config: &Config, fixtures: &Path) -> anyhow::Result<()> {
    let db = connect_postgres(config).await?;
    let crypto = auth_crypto(config)?;
    let fixture = seed::load_fixture(fixtures).with_context(|| {
        format!("failed to read fixture {}", fixtures.display())
    })?;

    let report = seed::seed_catalog(
        db.users(),
        db.movies(),
        &crypto,
        &config.admin.account(),
        fixture,
    )
    .await
    .context("seeding failed")?;

    if report.skipped {
        info!("Catalog already populated; nothing to seed");
    } else {
        info!(
            movies = report.movies_inserted,
            admin_created = report.admin_created,
            "Seed complete"
        );
    }
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let crypto = auth_crypto(&config)?;

    let (users, movies): (Arc<dyn UsersRepository>, Arc<dyn MoviesRepository>) =
        if config.database.url.is_some() {
            let db = connect_postgres(&config).await?;
            (Arc::new(db.users().clone()), Arc::new(db.movies().clone()))
        } else if config.dev_mode {
            let store = MemoryStore::new();
            let admin = config.admin.account();
            let fixture = Path::new(DEFAULT_FIXTURE);
            if fixture.exists() {
                let movies = seed::load_fixture(fixture)
                    .context("failed to read bundled fixture")?;
                seed::seed_catalog(&store, &store, &crypto, &admin, movies)
                    .await
                    .context("seeding failed")?;
            } else {
                seed::ensure_admin(&store, &crypto, &admin)
                    .await
                    .context("failed to create bootstrap administrator")?;
            }
            warn!("running on the in-memory store; data is not persisted");
            (Arc::new(store.clone()), Arc::new(store))
        } else {
            bail!(
                "no database configured; set DATABASE_URL or enable DEV_MODE"
            );
        };

    let bind_addr = config.bind_addr();
    let project = config.server.project_name.clone();
    let prefix = config.server.api_prefix.clone();
    let state = AppState::new(config, users, movies, crypto);
    let app = create_app(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, api_prefix = %prefix, "{project} API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
