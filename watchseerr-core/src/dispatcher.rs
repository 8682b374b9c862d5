//! Per-film request decision and dispatch.

use std::{collections::HashSet, time::Duration};

use tracing::{debug, info, warn};
use watchseerr_model::{CatalogId, EnrichedFilm, RequestOutcome, RequestStatus};

use crate::filters::{ChainVerdict, FilterChain, FilterContext};
use crate::providers::{ProviderError, RequestService};

pub const DEFAULT_REFRESH_ATTEMPTS: u32 = 3;
pub const DEFAULT_REFRESH_BACKOFF: Duration = Duration::from_millis(500);

/// Bounded retry for the already-requested refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub backoff: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_REFRESH_ATTEMPTS,
            backoff: DEFAULT_REFRESH_BACKOFF,
        }
    }
}

impl RefreshPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// `None` means unlimited.
    pub quota: Option<u32>,
    pub refresh: RefreshPolicy,
}

/// Mutable state for a single run; discarded when the run ends.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    already_requested: Option<HashSet<CatalogId>>,
    refresh_pending: bool,
    dispatched: u32,
    quota: Option<u32>,
}

impl RunState {
    pub fn new(quota: Option<u32>) -> Self {
        Self {
            quota: quota.filter(|q| *q > 0),
            ..Self::default()
        }
    }

    fn needs_refresh(&self) -> bool {
        self.already_requested.is_none() || self.refresh_pending
    }

    fn quota_reached(&self) -> bool {
        matches!(self.quota, Some(limit) if self.dispatched >= limit)
    }

    fn is_requested(&self, catalog_id: CatalogId) -> bool {
        self.already_requested
            .as_ref()
            .is_some_and(|set| set.contains(&catalog_id))
    }

    fn record_created(&mut self, catalog_id: CatalogId) {
        self.already_requested
            .get_or_insert_with(HashSet::new)
            .insert(catalog_id);
        self.dispatched += 1;
    }

    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }

    pub fn quota(&self) -> Option<u32> {
        self.quota
    }
}

/// Walks each film through refresh, dedup, filters, quota and create, in
/// that order. Films are handled strictly one at a time.
pub struct RequestDispatcher<'a> {
    service: &'a dyn RequestService,
    chain: &'a FilterChain,
    ctx: FilterContext,
    refresh: RefreshPolicy,
    state: RunState,
}

impl std::fmt::Debug for RequestDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("chain", &self.chain)
            .field("refresh", &self.refresh)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> RequestDispatcher<'a> {
    pub fn new(
        service: &'a dyn RequestService,
        chain: &'a FilterChain,
        ctx: FilterContext,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            service,
            chain,
            ctx,
            refresh: settings.refresh,
            state: RunState::new(settings.quota),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub async fn dispatch(&mut self, film: &EnrichedFilm) -> RequestOutcome {
        if self.state.needs_refresh()
            && let Err(err) = self.refresh_already_requested().await
        {
            self.state.refresh_pending = true;
            return RequestOutcome::new(
                RequestStatus::ProviderError,
                format!("already-requested refresh failed: {err}"),
            );
        }

        let (Some(catalog_id), true) = (film.catalog_id, film.has_metadata())
        else {
            return RequestOutcome::new(
                RequestStatus::MissingMetadata,
                missing_detail(film),
            );
        };

        if self.state.is_requested(catalog_id) {
            return RequestOutcome::new(RequestStatus::AlreadyRequested, "");
        }

        if let ChainVerdict::Rejected(outcome) =
            self.chain.evaluate(film, &self.ctx)
        {
            return RequestOutcome::new(
                RequestStatus::FilteredOut,
                outcome.summary(),
            );
        }

        if self.state.quota_reached() {
            let limit = self.state.quota.unwrap_or_default();
            return RequestOutcome::new(
                RequestStatus::QuotaReached,
                format!("limit of {limit} requests per run"),
            );
        }

        match self.service.create_request(catalog_id).await {
            Ok(()) => {
                self.state.record_created(catalog_id);
                info!(
                    %catalog_id,
                    title = %film.display_title(),
                    dispatched = self.state.dispatched,
                    "media request created"
                );
                RequestOutcome::new(RequestStatus::Created, "")
            }
            Err(err) => {
                RequestOutcome::new(RequestStatus::ProviderError, err.to_string())
            }
        }
    }

    async fn refresh_already_requested(&mut self) -> Result<(), ProviderError> {
        let attempts = self.refresh.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.service.list_already_requested().await {
                Ok(set) => {
                    debug!(
                        count = set.len(),
                        attempt, "already-requested set refreshed"
                    );
                    self.state.already_requested = Some(set);
                    self.state.refresh_pending = false;
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    let delay = self.refresh.delay_after(attempt);
                    warn!(
                        attempt,
                        error = %err,
                        retry_in = ?delay,
                        "already-requested refresh failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        attempts,
                        error = %err,
                        "already-requested refresh exhausted retries"
                    );
                    return Err(err);
                }
            }
        }
    }
}

fn missing_detail(film: &EnrichedFilm) -> &'static str {
    if film.metadata.is_none() {
        "no catalog metadata"
    } else {
        "no catalog id"
    }
}
