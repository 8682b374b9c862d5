use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub source: FileSourceConfig,
    #[serde(default)]
    pub catalog: FileCatalogConfig,
    #[serde(default)]
    pub requests: FileRequestsConfig,
    #[serde(default)]
    pub tasks: FileTasksConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub server: FileServerConfig,
    /// Humantime duration such as `30s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_endpoint: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_parallelism: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRequestsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_backoff: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileTasksConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_watchlist: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub source_base_url: Option<String>,
    pub source_username: Option<String>,
    pub source_password: Option<String>,
    pub catalog_api_key: Option<String>,
    pub requests_base_url: Option<String>,
    pub requests_api_key: Option<String>,
    pub requests_quota: Option<String>,
    pub request_filters: Option<Vec<String>>,
    pub sync_watchlist: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub server_enabled: Option<String>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub http_timeout: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = Self::default();

        env_config.config_path =
            std::env::var("WATCHSEERR_CONFIG").ok().map(PathBuf::from);

        env_config.source_base_url = non_empty_var("SOURCE_BASE_URL");
        env_config.source_username = non_empty_var("SOURCE_USERNAME");
        env_config.source_password = non_empty_var("SOURCE_PASSWORD");

        env_config.catalog_api_key = non_empty_var("TMDB_API_KEY");

        env_config.requests_base_url = non_empty_var("SEERR_BASE_URL");
        env_config.requests_api_key = non_empty_var("SEERR_API_KEY");
        env_config.requests_quota = non_empty_var("REQUESTS_QUOTA");
        env_config.request_filters = parse_csv_var("REQUEST_FILTERS");

        env_config.sync_watchlist = non_empty_var("SYNC_WATCHLIST_CRON");
        env_config.data_dir = std::env::var("DATA_DIR").ok().map(PathBuf::from);

        env_config.server_enabled = non_empty_var("SERVER_ENABLED");
        env_config.server_host = non_empty_var("SERVER_HOST");
        env_config.server_port = non_empty_var("SERVER_PORT");

        env_config.http_timeout = non_empty_var("HTTP_TIMEOUT");

        env_config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| split_csv(&raw))
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
