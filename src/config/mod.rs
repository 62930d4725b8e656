mod file_config;

pub use file_config::{FileConfig, NotificationsConfig};

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NotificationBackend {
    /// One row per notification in `notifications.db`.
    #[default]
    Sqlite,
    /// A single JSON document, `notifications.json`, rewritten on every change.
    Json,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub notification_backend: NotificationBackend,
    pub enable_sample_notifications: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub notification_backend: NotificationBackend,
    pub enable_sample_notifications: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ, both are {}", port);
        }

        let logging_level = match file.logging_level {
            Some(s) => parse_logging_level(&s)
                .ok_or_else(|| anyhow::anyhow!("Invalid logging_level {:?}", s))?,
            None => cli.logging_level.clone(),
        };

        let notifications = file.notifications.unwrap_or_default();
        let notification_backend = match notifications.backend {
            Some(s) => parse_notification_backend(&s)
                .ok_or_else(|| anyhow::anyhow!("Invalid notifications backend {:?}", s))?,
            None => cli.notification_backend,
        };
        let enable_sample_notifications = notifications
            .enable_samples
            .unwrap_or(cli.enable_sample_notifications);

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            notification_backend,
            enable_sample_notifications,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn notifications_db_path(&self) -> PathBuf {
        self.db_dir.join("notifications.db")
    }

    pub fn notifications_json_path(&self) -> PathBuf {
        self.db_dir.join("notifications.json")
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            enable_sample_notifications: self.enable_sample_notifications,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn parse_notification_backend(s: &str) -> Option<NotificationBackend> {
    NotificationBackend::from_str(s, true).ok()
}
