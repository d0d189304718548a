//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases and media directory.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use play_server::content_store::SqliteContentStore;
use play_server::library::LibraryManager;
use play_server::media::BlobStore;
use play_server::schedule::ScheduleClock;
use play_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use play_server::user::{SqliteUserStore, UserManager};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Largest upload accepted by test servers
pub const TEST_MAX_UPLOAD_SIZE: u64 = 1024 * 1024;

/// Test server instance with isolated storage
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Shared with the running app, for direct inspection in tests
    pub library: Arc<LibraryManager>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose kiosk follows the schedule of `TEST_USER`.
    pub async fn spawn() -> Self {
        Self::spawn_with_owner(Some(TEST_USER_ID)).await
    }

    /// Spawns a server with the given kiosk schedule owner.
    ///
    /// # Panics
    ///
    /// Panics if storage creation, port binding or server start fail.
    pub async fn spawn_with_owner(default_schedule_owner_id: Option<usize>) -> Self {
        let (temp_db_dir, user_db_path) =
            create_test_db_with_users().expect("Failed to create test database");

        let user_store = SqliteUserStore::new(&user_db_path).expect("Failed to open user store");
        let user_manager = Arc::new(Mutex::new(UserManager::new(Box::new(user_store))));

        let content_store = Arc::new(
            SqliteContentStore::new(temp_db_dir.path().join("content.db"))
                .expect("Failed to open content store"),
        );
        let blobs = BlobStore::new(temp_db_dir.path().join("media"), TEST_MAX_UPLOAD_SIZE);
        blobs.init().await.expect("Failed to create media directories");
        let library = Arc::new(LibraryManager::new(
            content_store,
            blobs,
            ScheduleClock::utc(),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 0,
            frontend_dir_path: None,
            default_schedule_owner_id,
            max_upload_size: TEST_MAX_UPLOAD_SIZE,
            enable_reboot: false,
        };

        let app = make_app(ServerState::new(config, library.clone(), user_manager));

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
            library,
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
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
