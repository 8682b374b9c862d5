//! Sequences one synchronization run: scrape, reconcile, enrich, dispatch,
//! persist.

use std::{collections::BTreeMap, fmt, sync::Arc};

use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;
use watchseerr_model::{
    CandidateItem, EnrichedFilm, OutcomeRecord, ProfitPolicy, RequestStatus,
};

use crate::dispatcher::{DispatcherSettings, RequestDispatcher};
use crate::error::Result;
use crate::filters::{FilterChain, FilterContext};
use crate::ledger::{
    DEFAULT_ENRICHMENT_PARALLELISM, EnrichmentReport, FilmLedger,
};
use crate::persistence::{LedgerStore, OutcomeLog};
use crate::providers::{CandidateSource, MetadataProvider, RequestService};

/// Remote collaborators used by every run.
#[derive(Clone)]
pub struct SyncServices {
    pub source: Arc<dyn CandidateSource>,
    pub catalog: Arc<dyn MetadataProvider>,
    pub requests: Arc<dyn RequestService>,
}

impl fmt::Debug for SyncServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncServices")
            .field("catalog", &self.catalog.name())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub primary_endpoint: String,
    pub secondary_endpoint: String,
    pub filters: Vec<String>,
    pub profit_policy: ProfitPolicy,
    pub dispatcher: DispatcherSettings,
    pub enrichment_parallelism: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            primary_endpoint: "/watchlist".to_string(),
            secondary_endpoint: "/watchlist/on/favorite-services".to_string(),
            filters: Vec::new(),
            profit_policy: ProfitPolicy::default(),
            dispatcher: DispatcherSettings::default(),
            enrichment_parallelism: DEFAULT_ENRICHMENT_PARALLELISM,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncStores {
    pub ledger: LedgerStore,
    pub outcomes: OutcomeLog,
}

/// Everything a single run works with, built fresh per run.
#[derive(Debug)]
pub struct RunContext<'a> {
    pub run_id: Uuid,
    pub services: &'a SyncServices,
    pub stores: &'a SyncStores,
    pub settings: &'a SyncSettings,
    pub chain: FilterChain,
    pub filter_ctx: FilterContext,
}

impl<'a> RunContext<'a> {
    pub fn new(
        services: &'a SyncServices,
        stores: &'a SyncStores,
        settings: &'a SyncSettings,
    ) -> Self {
        let (chain, _unknown) = FilterChain::from_names(&settings.filters);
        Self {
            run_id: Uuid::now_v7(),
            services,
            stores,
            settings,
            chain,
            filter_ctx: FilterContext::current(settings.profit_policy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub candidates: usize,
    pub enrichment: EnrichmentReport,
    pub statuses: BTreeMap<RequestStatus, usize>,
    /// False when a snapshot or the outcome log could not be written.
    pub persisted: bool,
}

impl RunSummary {
    pub fn count(&self, status: RequestStatus) -> usize {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOrchestrator {
    services: SyncServices,
    stores: SyncStores,
    settings: SyncSettings,
}

impl SyncOrchestrator {
    pub fn new(
        services: SyncServices,
        stores: SyncStores,
        settings: SyncSettings,
    ) -> Self {
        Self {
            services,
            stores,
            settings,
        }
    }

    pub fn stores(&self) -> &SyncStores {
        &self.stores
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let ctx = RunContext::new(&self.services, &self.stores, &self.settings);
        let span = info_span!("sync_run", run_id = %ctx.run_id);
        execute(ctx).instrument(span).await
    }
}

async fn execute(ctx: RunContext<'_>) -> Result<RunSummary> {
    info!(filters = ?ctx.chain.filters(), "synchronization started");

    let previous = load_previous(&ctx.stores.ledger);

    let primary = ctx
        .services
        .source
        .list(&ctx.settings.primary_endpoint)
        .await?;
    let secondary = ctx
        .services
        .source
        .list(&ctx.settings.secondary_endpoint)
        .await?;
    info!(
        primary = primary.len(),
        secondary = secondary.len(),
        "candidate lists fetched"
    );

    let mut ledger = FilmLedger::merge(&previous, &primary);
    ledger.cross_reference(&secondary_members(&primary, secondary));

    let enrichment = ledger
        .enrich_missing(
            ctx.services.catalog.as_ref(),
            ctx.settings.enrichment_parallelism,
        )
        .await;
    info!(
        attempted = enrichment.attempted,
        resolved = enrichment.resolved,
        failed = enrichment.failed,
        "enrichment finished"
    );

    let mut dispatcher = RequestDispatcher::new(
        ctx.services.requests.as_ref(),
        &ctx.chain,
        ctx.filter_ctx,
        ctx.settings.dispatcher,
    );

    let mut records = Vec::with_capacity(ledger.len());
    let mut statuses = BTreeMap::new();
    for film in ledger.films() {
        let outcome = dispatcher.dispatch(film).await;
        let title = film.display_title();
        info!(
            catalog_id = ?film.catalog_id.map(|id| id.get()),
            title = %title,
            status = %outcome.status,
            detail = %outcome.detail,
            "request outcome"
        );
        *statuses.entry(outcome.status).or_insert(0) += 1;
        records.push(OutcomeRecord {
            catalog_id: film.catalog_id,
            title,
            status: outcome.status,
            detail: outcome.detail,
        });
    }

    let candidates = ledger.len();
    let persisted = persist(&ctx.stores, &ledger.into_films(), &records);

    info!(
        candidates,
        created = statuses.get(&RequestStatus::Created).copied().unwrap_or(0),
        persisted,
        "synchronization finished"
    );

    Ok(RunSummary {
        run_id: ctx.run_id,
        candidates,
        enrichment,
        statuses,
        persisted,
    })
}

fn load_previous(store: &LedgerStore) -> Vec<EnrichedFilm> {
    match store.load() {
        Ok(films) => films,
        Err(err) => {
            warn!(
                error = %err,
                "previous ledger unreadable; starting from an empty ledger"
            );
            Vec::new()
        }
    }
}

/// Secondary list plus primary items the source flagged inline.
fn secondary_members(
    primary: &[CandidateItem],
    mut secondary: Vec<CandidateItem>,
) -> Vec<CandidateItem> {
    secondary.extend(
        primary
            .iter()
            .filter(|item| item.in_secondary == Some(true))
            .cloned(),
    );
    secondary
}

fn persist(
    stores: &SyncStores,
    films: &[EnrichedFilm],
    records: &[OutcomeRecord],
) -> bool {
    let mut ok = true;
    if let Err(err) = stores.ledger.save(films) {
        error!(error = %err, "failed to write ledger snapshot");
        ok = false;
    }
    if let Err(err) = stores.outcomes.write(records) {
        error!(error = %err, "failed to write outcome log");
        ok = false;
    }
    ok
}
