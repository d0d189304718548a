use super::RequestsLoggingLevel;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    /// Tenant served by the public kiosk endpoints.
    pub default_schedule_owner_id: Option<usize>,
    pub max_upload_size: u64,
    pub enable_reboot: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            content_cache_age_sec: 3600,
            frontend_dir_path: None,
            default_schedule_owner_id: None,
            max_upload_size: 100 * 1024 * 1024,
            enable_reboot: false,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            content_cache_age_sec: config.content_cache_age_sec,
            frontend_dir_path: config.frontend_dir_path.clone(),
            default_schedule_owner_id: config.default_schedule_owner_id,
            max_upload_size: config.max_upload_size,
            enable_reboot: config.enable_reboot,
        }
    }
}
