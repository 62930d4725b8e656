//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use oversight_notifications::config::NotificationBackend;
use oversight_notifications::notifications::{
    JsonFileNotificationStore, NotificationStore, SqliteNotificationStore,
};
use oversight_notifications::server::{make_app, RequestsLoggingLevel, ServerConfig};
use oversight_notifications::user::{SqliteUserStore, UserStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Id of the `TEST_USER` account
    pub test_user_id: String,

    /// Id of the `OTHER_USER` account
    pub other_user_id: String,

    /// User store for direct database access in tests
    pub user_store: Arc<dyn UserStore>,

    /// Notification store for direct access in tests
    pub notification_store: Arc<dyn NotificationStore>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server backed by the SQLite notification store
    pub async fn spawn() -> Self {
        Self::spawn_with(NotificationBackend::Sqlite, false).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates a temporary database directory with test users
    /// 2. Opens the notification store for the given backend in the same directory
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if database creation, port binding or server startup fails.
    pub async fn spawn_with(backend: NotificationBackend, enable_samples: bool) -> Self {
        let (temp_db_dir, user_db_path, user_ids) =
            create_test_db_with_users().expect("Failed to create test database");

        let user_store: Arc<dyn UserStore> =
            Arc::new(SqliteUserStore::new(&user_db_path).expect("Failed to open user store"));

        let notification_store: Arc<dyn NotificationStore> = match backend {
            NotificationBackend::Sqlite => Arc::new(
                SqliteNotificationStore::new(temp_db_dir.path().join("notifications.db"))
                    .expect("Failed to open notification store"),
            ),
            NotificationBackend::Json => Arc::new(
                JsonFileNotificationStore::new(temp_db_dir.path().join("notifications.json"))
                    .expect("Failed to open notification store"),
            ),
        };

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            enable_sample_notifications: enable_samples,
            ..ServerConfig::default()
        };

        let app = make_app(config, user_store.clone(), notification_store.clone())
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            test_user_id: user_ids.test_user_id,
            other_user_id: user_ids.other_user_id,
            user_store,
            notification_store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
