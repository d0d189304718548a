use anyhow::Result;
use clap::Parser;
use std::sync::{Arc, Mutex};
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use play_server::config;
use play_server::content_store::SqliteContentStore;
use play_server::library::LibraryManager;
use play_server::media::BlobStore;
use play_server::schedule::ScheduleClock;
use play_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use play_server::user::{SqliteUserStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the database files (content.db, user.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Directory where uploaded videos and thumbnails are stored.
    /// Defaults to <db-dir>/media.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of streamed videos in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// IANA time zone used to decide the current weekday.
    #[clap(long, default_value = "UTC")]
    pub time_zone: String,

    /// User whose schedule drives the public kiosk endpoints.
    #[clap(long)]
    pub default_schedule_owner_id: Option<usize>,

    /// Largest accepted video upload, in megabytes.
    #[clap(long, default_value_t = 100)]
    pub max_upload_size_mb: u64,

    /// Allow signed-in users to reboot the host.
    #[clap(long)]
    pub enable_reboot: bool,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            media_path: args.media_path.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            frontend_dir_path: args.frontend_dir_path.clone(),
            time_zone: args.time_zone.clone(),
            default_schedule_owner_id: args.default_schedule_owner_id,
            max_upload_size_mb: args.max_upload_size_mb,
            enable_reboot: args.enable_reboot,
        }
    }
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
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // TOML overrides CLI
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  media_path: {:?}", app_config.media_path);
    info!("  port: {}", app_config.port);
    info!("  time_zone: {}", app_config.time_zone);

    if !app_config.content_db_path().exists() {
        info!(
            "Creating new content database at {:?}",
            app_config.content_db_path()
        );
    }
    let content_store = Arc::new(SqliteContentStore::new(app_config.content_db_path())?);

    if !app_config.user_db_path().exists() {
        info!(
            "Creating new user database at {:?}",
            app_config.user_db_path()
        );
    }
    let user_store = SqliteUserStore::new(app_config.user_db_path())?;
    let user_manager = Arc::new(Mutex::new(UserManager::new(Box::new(user_store))));

    let blobs = BlobStore::new(&app_config.media_path, app_config.max_upload_size);
    blobs.init().await?;

    let clock = ScheduleClock::new(&app_config.time_zone)?;
    let library = Arc::new(LibraryManager::new(content_store, blobs, clock));

    match app_config.default_schedule_owner_id {
        Some(owner) => info!("Kiosk follows the schedule of user {}", owner),
        None => warn!("No default schedule owner configured, the public player is disabled"),
    }

    info!("Ready to serve at port {}!", app_config.port);
    run_server(ServerConfig::from(&app_config), library, user_manager).await
}
