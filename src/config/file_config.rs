use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration. Every value present here wins over the
/// matching command line flag.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub media_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,
    pub frontend_dir_path: Option<String>,

    /// IANA time zone used to decide which weekday it is.
    pub time_zone: Option<String>,
    /// User whose schedule drives the public kiosk endpoints.
    pub default_schedule_owner_id: Option<usize>,
    pub max_upload_size_mb: Option<u64>,
    pub enable_reboot: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
