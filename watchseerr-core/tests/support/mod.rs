#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::Notify;
use watchseerr_core::{
    LedgerStore, OutcomeLog, SyncOrchestrator, SyncServices, SyncSettings,
    SyncStores,
    providers::{
        CandidateSource, EnrichmentRequest, MetadataProvider, ProviderError,
        RequestService, ResolvedFilm, SourceError,
    },
};
use watchseerr_model::{CandidateItem, CatalogId, ExternalId, FilmMetadata};

pub const PRIMARY: &str = "/watchlist";
pub const SECONDARY: &str = "/watchlist/on/favorite-services";

pub fn candidate(id: u64) -> CandidateItem {
    CandidateItem::new(ExternalId(id), format!("/film/{id}/"))
        .with_slug(format!("film-{id}"))
}

pub fn released_metadata(title: &str) -> FilmMetadata {
    FilmMetadata {
        title: title.to_string(),
        budget: 1_000,
        revenue: 5_000,
        release_date: "1999-03-31".to_string(),
    }
}

/// Candidate lists keyed by endpoint. A gated source holds the primary
/// fetch until the gate is notified.
#[derive(Default)]
pub struct FakeSource {
    lists: Mutex<HashMap<String, Vec<CandidateItem>>>,
    fail_with_unauthorized: bool,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(primary: Vec<CandidateItem>, secondary: Vec<CandidateItem>) -> Self {
        let mut lists = HashMap::new();
        lists.insert(PRIMARY.to_string(), primary);
        lists.insert(SECONDARY.to_string(), secondary);
        Self {
            lists: Mutex::new(lists),
            ..Self::default()
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            fail_with_unauthorized: true,
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl CandidateSource for FakeSource {
    async fn list(
        &self,
        endpoint: &str,
    ) -> Result<Vec<CandidateItem>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gate.as_ref().filter(|_| endpoint == PRIMARY) {
            gate.notified().await;
        }
        if self.fail_with_unauthorized {
            return Err(SourceError::Unauthorized);
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves external id `n` to catalog id `n * 100`; ids listed in
/// `unknown` resolve to `NotFound`.
#[derive(Default)]
pub struct FakeCatalog {
    pub unknown: HashSet<u64>,
    pub calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for FakeCatalog {
    async fn resolve(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<ResolvedFilm, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = request.candidate.external_id.get();
        if self.unknown.contains(&id) {
            return Err(ProviderError::NotFound);
        }
        Ok(ResolvedFilm {
            catalog_id: CatalogId(id * 100),
            metadata: released_metadata(&format!("Film {id}")),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeRequests {
    pub requested: Mutex<HashSet<CatalogId>>,
    pub created: Mutex<Vec<CatalogId>>,
}

impl FakeRequests {
    pub fn with_requested(ids: &[u64]) -> Self {
        let fake = Self::default();
        fake.requested
            .lock()
            .unwrap()
            .extend(ids.iter().copied().map(CatalogId));
        fake
    }

    pub fn created(&self) -> Vec<CatalogId> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestService for FakeRequests {
    async fn list_already_requested(
        &self,
    ) -> Result<HashSet<CatalogId>, ProviderError> {
        Ok(self.requested.lock().unwrap().clone())
    }

    async fn create_request(
        &self,
        catalog_id: CatalogId,
    ) -> Result<(), ProviderError> {
        self.requested.lock().unwrap().insert(catalog_id);
        self.created.lock().unwrap().push(catalog_id);
        Ok(())
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub catalog: Arc<FakeCatalog>,
    pub requests: Arc<FakeRequests>,
    pub orchestrator: SyncOrchestrator,
}

pub fn harness(
    dir: &Path,
    source: FakeSource,
    catalog: FakeCatalog,
    requests: FakeRequests,
    settings: SyncSettings,
) -> Harness {
    let source = Arc::new(source);
    let catalog = Arc::new(catalog);
    let requests = Arc::new(requests);

    let services = SyncServices {
        source: source.clone(),
        catalog: catalog.clone(),
        requests: requests.clone(),
    };
    let stores = SyncStores {
        ledger: LedgerStore::new(dir.join("films.json")),
        outcomes: OutcomeLog::new(dir.join("last_requests.csv")),
    };

    Harness {
        source,
        catalog,
        requests,
        orchestrator: SyncOrchestrator::new(services, stores, settings),
    }
}
