use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sandboxed_assets::SandboxedRoot;
use sheet_catalog::{
    auth::HmacTokenVerifier,
    config::Config,
    database::{Database, repositories::SheetSeaOrmRepository},
    models::SheetCreateRequest,
    repositories::SheetRepository,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "sheet-catalog")]
#[command(version)]
#[command(about = "A catalog service for musical score sheets")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Directory holding `sheets/` (overrides config file and CONFIG_PATH)
    #[arg(short = 'a', long, value_name = "DIR")]
    asset_root: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token for sheet deletion
    IssueToken {
        /// Who the token is issued to
        #[arg(long)]
        subject: String,
    },
    /// Record a sheet's metadata; its files are placed under the asset root separately
    Register {
        #[arg(long)]
        title: String,
        #[arg(long)]
        composer: String,
    },
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    if let Some(asset_root) = cli.asset_root {
        config.storage.root = asset_root;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::IssueToken { subject } => issue_token(&config, &subject),
        Command::Register { title, composer } => register(&config, title, composer).await,
        Command::PrintConfig => print_config(config),
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let log_filter = if log_level == "trace" {
        format!("sheet_catalog={log_level},sandboxed_assets={log_level},tower_http=trace")
    } else {
        format!("sheet_catalog={log_level},sandboxed_assets={log_level}")
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(mut config: Config) -> Result<()> {
    info!("Starting Sheet Catalog v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.token_secret.is_empty() {
        warn!(
            "auth.token_secret is not set; using an ephemeral secret. \
             Tokens will stop working when the process restarts"
        );
        config.auth.token_secret = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
    }
    let verifier =
        HmacTokenVerifier::new(config.auth.token_secret.as_bytes(), config.auth.token_ttl)
            .context("Invalid auth configuration")?;

    info!("Using database: {}", config.database.url);
    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let asset_root = SandboxedRoot::builder()
        .base_directory(&config.storage.root)
        .create_missing(true)
        .build()
        .await
        .with_context(|| {
            format!("Failed to open asset root {}", config.storage.root.display())
        })?;
    info!("Serving assets from: {}", asset_root.base_dir().display());

    let state = AppState::new(config, database, asset_root, Arc::new(verifier));
    let server = WebServer::new(state)?;
    info!("Web server starting on http://{}:{}", server.host(), server.port());
    server.serve().await?;

    info!("Sheet Catalog stopped");
    Ok(())
}

fn issue_token(config: &Config, subject: &str) -> Result<()> {
    if config.auth.token_secret.is_empty() {
        anyhow::bail!(
            "auth.token_secret must be configured to issue tokens the server will accept"
        );
    }
    let verifier =
        HmacTokenVerifier::new(config.auth.token_secret.as_bytes(), config.auth.token_ttl)?;
    let token = verifier.issue(subject)?;
    info!(subject = %subject, ttl = ?config.auth.token_ttl, "Issued bearer token");
    println!("{token}");
    Ok(())
}

async fn register(config: &Config, title: String, composer: String) -> Result<()> {
    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let repository = SheetSeaOrmRepository::new(database.connection());
    let sheet = repository
        .create(SheetCreateRequest::new(title, composer))
        .await?;

    println!("{}/{}", sheet.safe_composer_name, sheet.safe_sheet_name);
    Ok(())
}

fn print_config(mut config: Config) -> Result<()> {
    if !config.auth.token_secret.is_empty() {
        config.auth.token_secret = "<redacted>".to_string();
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
