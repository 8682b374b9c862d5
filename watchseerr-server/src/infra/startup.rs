use std::sync::Arc;

use anyhow::Context;
use watchseerr_config::Config;
use watchseerr_core::{
    DispatcherSettings, LedgerStore, OutcomeLog, RefreshPolicy,
    SyncOrchestrator, SyncRunner, SyncServices, SyncSettings, SyncStores,
    providers::{HttpCandidateSource, SeerrClient, TmdbProvider},
};

const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with the configured request timeout.
pub fn http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

pub fn sync_services(
    config: &Config,
    client: reqwest::Client,
) -> SyncServices {
    let source = HttpCandidateSource::new(
        client.clone(),
        config.source.base_url.clone(),
        config.source.username.clone(),
        config.source.password.expose(),
    );
    let catalog = TmdbProvider::new(
        client.clone(),
        config.catalog.api_key.expose(),
        config.catalog.base_url.clone(),
        config.source.page_base_url.clone(),
    );
    let requests = SeerrClient::new(
        client,
        config.requests.base_url.clone(),
        config.requests.api_key.expose(),
    )
    .with_user_id(config.requests.user_id);

    SyncServices {
        source: Arc::new(source),
        catalog: Arc::new(catalog),
        requests: Arc::new(requests),
    }
}

pub fn sync_settings(config: &Config) -> SyncSettings {
    SyncSettings {
        primary_endpoint: config.source.primary_endpoint.clone(),
        secondary_endpoint: config.source.secondary_endpoint.clone(),
        filters: config.requests.filters.clone(),
        profit_policy: config.requests.profit_policy,
        dispatcher: DispatcherSettings {
            quota: config.requests.quota_limit(),
            refresh: RefreshPolicy {
                attempts: config.requests.refresh_attempts,
                backoff: config.requests.refresh_backoff,
            },
        },
        enrichment_parallelism: config.catalog.enrichment_parallelism,
    }
}

pub fn sync_stores(config: &Config) -> SyncStores {
    SyncStores {
        ledger: LedgerStore::new(config.storage.ledger_path()),
        outcomes: OutcomeLog::new(config.storage.outcome_path()),
    }
}

/// Wires remote clients, stores and settings into a single-flight runner.
pub fn build_runner(config: &Config) -> anyhow::Result<SyncRunner> {
    let client = http_client(config)?;
    let orchestrator = SyncOrchestrator::new(
        sync_services(config, client),
        sync_stores(config),
        sync_settings(config),
    );
    Ok(SyncRunner::new(orchestrator))
}
