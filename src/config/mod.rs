mod file_config;

pub use file_config::FileConfig;

use crate::schedule::ScheduleClock;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub time_zone: String,
    pub default_schedule_owner_id: Option<usize>,
    pub max_upload_size_mb: u64,
    pub enable_reboot: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub time_zone: String,
    pub default_schedule_owner_id: Option<usize>,
    /// Upload limit in bytes.
    pub max_upload_size: u64,
    pub enable_reboot: bool,
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

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("media"));
        std::fs::create_dir_all(&media_path)
            .with_context(|| format!("Failed to create media directory {:?}", media_path))?;

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let time_zone = file.time_zone.unwrap_or_else(|| cli.time_zone.clone());
        ScheduleClock::new(&time_zone)?;

        let default_schedule_owner_id = file
            .default_schedule_owner_id
            .or(cli.default_schedule_owner_id);

        let max_upload_size_mb = file.max_upload_size_mb.unwrap_or(cli.max_upload_size_mb);
        if max_upload_size_mb == 0 {
            bail!("max_upload_size_mb must be greater than zero");
        }
        let Some(max_upload_size) = max_upload_size_mb.checked_mul(BYTES_PER_MB) else {
            bail!("max_upload_size_mb is too large: {}", max_upload_size_mb);
        };

        let enable_reboot = file.enable_reboot.unwrap_or(cli.enable_reboot);

        Ok(Self {
            db_dir,
            media_path,
            port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            time_zone,
            default_schedule_owner_id,
            max_upload_size,
            enable_reboot,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.db_dir.join("content.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
