use std::{fmt, path::PathBuf, time::Duration};

use url::Url;
use watchseerr_model::ProfitPolicy;

use crate::cadence::Cadence;

const LEDGER_FILE: &str = "films.json";
const OUTCOME_FILE: &str = "last_requests.csv";

/// Credential value whose `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Candidate list service.
    pub base_url: Url,
    /// Site that serves the film pages referenced by `source_link`.
    pub page_base_url: Url,
    pub username: String,
    pub password: Secret,
    pub primary_endpoint: String,
    pub secondary_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: Secret,
    pub base_url: Url,
    pub enrichment_parallelism: usize,
}

#[derive(Debug, Clone)]
pub struct RequestsConfig {
    pub base_url: Url,
    pub api_key: Secret,
    /// `<= 0` means unlimited.
    pub quota: i64,
    pub filters: Vec<String>,
    pub profit_policy: ProfitPolicy,
    pub user_id: Option<u64>,
    pub refresh_attempts: u32,
    pub refresh_backoff: Duration,
}

impl RequestsConfig {
    pub fn quota_limit(&self) -> Option<u32> {
        if self.quota <= 0 {
            None
        } else {
            Some(u32::try_from(self.quota).unwrap_or(u32::MAX))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TasksConfig {
    pub sync_watchlist: Cadence,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    pub fn outcome_path(&self) -> PathBuf {
        self.data_dir.join(OUTCOME_FILE)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub catalog: CatalogConfig,
    pub requests: RequestsConfig,
    pub tasks: TasksConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub http_timeout: Duration,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir)
    }
}
