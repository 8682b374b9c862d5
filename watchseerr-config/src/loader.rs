use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;
use watchseerr_model::ProfitPolicy;

use crate::{
    cadence::{Cadence, CadenceError},
    models::{
        CatalogConfig, Config, ConfigMetadata, RequestsConfig, Secret,
        ServerConfig, SourceConfig, StorageConfig, TasksConfig,
    },
    sources::{EnvConfig, FileConfig, parse_bool},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["watchseerr.toml", "config/watchseerr.toml"];

const DEFAULT_PAGE_BASE_URL: &str = "https://letterboxd.com";
const DEFAULT_CATALOG_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_PRIMARY_ENDPOINT: &str = "/watchlist";
const DEFAULT_SECONDARY_ENDPOINT: &str = "/watchlist/on/favorite-services";
const DEFAULT_ENRICHMENT_PARALLELISM: usize = 6;
const DEFAULT_REFRESH_ATTEMPTS: u32 = 3;
const DEFAULT_REFRESH_BACKOFF: Duration = Duration::from_millis(500);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SERVER_PORT: u16 = 3333;

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Reads the env file, the environment and the TOML file, then
    /// composes and validates them. Environment values win over the file.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        Self::compose(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let source = ConfigPathSource {
            explicit: self.options.config_path.clone(),
            env: env_config.config_path.clone(),
            default: DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists()),
        };

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        tracing::debug!(
            path = %path.display(),
            ?provenance,
            "loading configuration file"
        );
        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }

    /// Merges file and environment values over the built-in defaults.
    pub fn compose(
        file_config: Option<FileConfig>,
        env: EnvConfig,
        metadata: ConfigMetadata,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if metadata.config_path.is_none() {
            warnings.push_with_hint(
                "No watchseerr.toml detected; falling back to environment variables",
                "Pass --config or set WATCHSEERR_CONFIG to use a configuration file",
            );
        }

        let FileConfig {
            source: file_source,
            catalog: file_catalog,
            requests: file_requests,
            tasks: file_tasks,
            storage: file_storage,
            server: file_server,
            http_timeout: file_http_timeout,
        } = file_config.unwrap_or_default();

        let source = SourceConfig {
            base_url: required_url(
                "source.base_url",
                "SOURCE_BASE_URL",
                env.source_base_url.or(file_source.base_url),
            )?,
            page_base_url: parse_url(
                "source.page_base_url",
                file_source
                    .page_base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_PAGE_BASE_URL),
            )?,
            username: required(
                "source.username",
                "SOURCE_USERNAME",
                env.source_username.or(file_source.username),
            )?,
            password: Secret::new(required(
                "source.password",
                "SOURCE_PASSWORD",
                env.source_password.or(file_source.password),
            )?),
            primary_endpoint: file_source
                .primary_endpoint
                .unwrap_or_else(|| DEFAULT_PRIMARY_ENDPOINT.to_string()),
            secondary_endpoint: file_source
                .secondary_endpoint
                .unwrap_or_else(|| DEFAULT_SECONDARY_ENDPOINT.to_string()),
        };

        let catalog = CatalogConfig {
            api_key: Secret::new(required(
                "catalog.api_key",
                "TMDB_API_KEY",
                env.catalog_api_key.or(file_catalog.api_key),
            )?),
            base_url: parse_url(
                "catalog.base_url",
                file_catalog
                    .base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_CATALOG_BASE_URL),
            )?,
            enrichment_parallelism: file_catalog
                .enrichment_parallelism
                .unwrap_or(DEFAULT_ENRICHMENT_PARALLELISM),
        };

        let profit_policy = match file_requests.profit_policy.as_deref() {
            Some(raw) => raw.parse::<ProfitPolicy>().map_err(|reason| {
                ConfigLoadError::InvalidValue {
                    field: "requests.profit_policy",
                    reason,
                }
            })?,
            None => ProfitPolicy::default(),
        };

        let requests = RequestsConfig {
            base_url: required_url(
                "requests.base_url",
                "SEERR_BASE_URL",
                env.requests_base_url.or(file_requests.base_url),
            )?,
            api_key: Secret::new(required(
                "requests.api_key",
                "SEERR_API_KEY",
                env.requests_api_key.or(file_requests.api_key),
            )?),
            quota: env_override(
                "requests.quota",
                env.requests_quota.as_deref(),
                parse_integer,
            )?
            .or(file_requests.quota)
            .unwrap_or(-1),
            filters: env
                .request_filters
                .or(file_requests.filters)
                .unwrap_or_default(),
            profit_policy,
            user_id: file_requests.user_id,
            refresh_attempts: file_requests
                .refresh_attempts
                .unwrap_or(DEFAULT_REFRESH_ATTEMPTS),
            refresh_backoff: parse_duration(
                "requests.refresh_backoff",
                file_requests.refresh_backoff.as_deref(),
                DEFAULT_REFRESH_BACKOFF,
            )?,
        };

        let tasks = TasksConfig {
            sync_watchlist: Cadence::parse(
                env.sync_watchlist
                    .or(file_tasks.sync_watchlist)
                    .as_deref()
                    .unwrap_or(crate::cadence::DISABLED),
            )?,
        };

        let storage = StorageConfig {
            data_dir: env
                .data_dir
                .or(file_storage.data_dir)
                .unwrap_or_else(|| PathBuf::from("./data")),
        };

        let server = ServerConfig {
            enabled: env_override(
                "server.enabled",
                env.server_enabled.as_deref(),
                parse_flag,
            )?
            .or(file_server.enabled)
            .unwrap_or(true),
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_override(
                "server.port",
                env.server_port.as_deref(),
                parse_integer,
            )?
            .or(file_server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
        };

        let http_timeout = parse_duration(
            "http_timeout",
            env.http_timeout.or(file_http_timeout).as_deref(),
            DEFAULT_HTTP_TIMEOUT,
        )?;

        let config = Config {
            source,
            catalog,
            requests,
            tasks,
            storage,
            server,
            http_timeout,
            metadata,
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn required(
    field: &'static str,
    env: &'static str,
    value: Option<String>,
) -> Result<String, ConfigLoadError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .ok_or(ConfigLoadError::MissingField { field, env })
}

fn required_url(
    field: &'static str,
    env: &'static str,
    value: Option<String>,
) -> Result<Url, ConfigLoadError> {
    let raw = required(field, env, value)?;
    parse_url(field, &raw)
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigLoadError> {
    Url::parse(raw.trim())
        .map_err(|source| ConfigLoadError::InvalidUrl { field, source })
}

fn env_override<T>(
    field: &'static str,
    raw: Option<&str>,
    parse: fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigLoadError> {
    raw.map(|value| {
        parse(value.trim())
            .map_err(|reason| ConfigLoadError::InvalidValue { field, reason })
    })
    .transpose()
}

fn parse_integer<T>(raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|err| format!("{raw:?}: {err}"))
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    parse_bool(raw).ok_or_else(|| format!("{raw:?} is not a boolean"))
}

fn parse_duration(
    field: &'static str,
    raw: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(value) => humantime::parse_duration(value.trim()).map_err(
            |source| ConfigLoadError::InvalidDuration { field, source },
        ),
        None => Ok(default),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting {field} (set {env})")]
    MissingField {
        field: &'static str,
        env: &'static str,
    },
    #[error("invalid URL for {field}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration for {field}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Cadence(#[from] CadenceError),
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}
