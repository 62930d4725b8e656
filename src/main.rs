use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oversight_notifications::config::{AppConfig, CliConfig, FileConfig, NotificationBackend};
use oversight_notifications::server::{self, run_server, RequestsLoggingLevel};
use oversight_notifications::{
    JsonFileNotificationStore, NotificationStore, SqliteNotificationStore, SqliteUserStore,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding user.db and the notification store.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Where notifications are persisted.
    #[clap(long, default_value = "sqlite")]
    pub notification_backend: NotificationBackend,

    /// Exposes the endpoint that seeds sample notifications for the caller.
    #[clap(long)]
    pub enable_sample_notifications: bool,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            notification_backend: args.notification_backend,
            enable_sample_notifications: args.enable_sample_notifications,
        }
    }
}

fn open_notification_store(config: &AppConfig) -> Result<Arc<dyn NotificationStore>> {
    Ok(match config.notification_backend {
        NotificationBackend::Sqlite => {
            let path = config.notifications_db_path();
            info!("Opening SQLite notification store at {:?}...", path);
            Arc::new(SqliteNotificationStore::new(path)?)
        }
        NotificationBackend::Json => {
            let path = config.notifications_json_path();
            info!("Opening JSON notification store at {:?}...", path);
            Arc::new(JsonFileNotificationStore::new(path)?)
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let user_db_path = app_config.user_db_path();
    info!("Opening SQLite user database at {:?}...", user_db_path);
    let user_store = Arc::new(SqliteUserStore::new(&user_db_path)?);
    let notification_store = open_notification_store(&app_config)?;

    if app_config.enable_sample_notifications {
        info!("Sample notifications endpoint enabled");
    }

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(app_config.server_config(), user_store, notification_store).await
}
