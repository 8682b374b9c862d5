use std::time::Duration;

use thiserror::Error;

use crate::models::{Config, Secret};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("credential {field} is blank")]
    BlankSecret { field: &'static str },
    #[error("source username must not be blank")]
    BlankUsername,
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("catalog.enrichment_parallelism must be at least 1")]
    ZeroParallelism,
    #[error("requests.refresh_attempts must be at least 1")]
    ZeroRefreshAttempts,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.source.username.trim().is_empty() {
        return Err(ConfigGuardRailError::BlankUsername);
    }
    require_secret("SOURCE_PASSWORD", &config.source.password)?;
    require_secret("TMDB_API_KEY", &config.catalog.api_key)?;
    require_secret("SEERR_API_KEY", &config.requests.api_key)?;

    require_duration("http_timeout", config.http_timeout)?;
    if config.catalog.enrichment_parallelism == 0 {
        return Err(ConfigGuardRailError::ZeroParallelism);
    }
    if config.requests.refresh_attempts == 0 {
        return Err(ConfigGuardRailError::ZeroRefreshAttempts);
    }

    if config.requests.filters.is_empty() {
        warnings.push_with_hint(
            "No request filters configured; every eligible film will be requested",
            "Set REQUEST_FILTERS, e.g. `released,profitable`",
        );
    }

    if config
        .requests
        .filters
        .iter()
        .any(|name| name.eq_ignore_ascii_case("dry_run"))
    {
        warnings.push(
            "dry_run filter enabled; no media requests will be created",
        );
    }

    if !config.tasks.sync_watchlist.is_enabled() {
        warnings.push_with_hint(
            "Scheduled watchlist sync is disabled",
            "Set SYNC_WATCHLIST_CRON to a cron expression to run periodically",
        );
    }

    if !config.server.enabled && !config.tasks.sync_watchlist.is_enabled() {
        warnings.push(
            "Neither the HTTP server nor the scheduler is enabled; `serve` will exit immediately",
        );
    }

    Ok(warnings)
}

fn require_secret(
    field: &'static str,
    secret: &Secret,
) -> Result<(), ConfigGuardRailError> {
    if secret.is_blank() {
        return Err(ConfigGuardRailError::BlankSecret { field });
    }
    Ok(())
}

fn require_duration(
    field: &'static str,
    value: Duration,
) -> Result<(), ConfigGuardRailError> {
    if value.is_zero() {
        return Err(ConfigGuardRailError::ZeroDuration { field });
    }
    Ok(())
}
