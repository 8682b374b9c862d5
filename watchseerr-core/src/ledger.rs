//! Film ledger: reconciles this run's candidates with the previous snapshot.

use futures::{StreamExt, stream};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use watchseerr_model::{CandidateItem, EnrichedFilm, ExternalId};

use crate::providers::{EnrichmentRequest, MetadataProvider, ProviderError};

pub const DEFAULT_ENRICHMENT_PARALLELISM: usize = 6;

/// Counters for one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub attempted: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Ordered list of films observed this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilmLedger {
    films: Vec<EnrichedFilm>,
}

impl FilmLedger {
    /// Builds this run's ledger from the fresh candidates, carrying cached
    /// metadata forward by external id. Previous records that are no longer
    /// listed are dropped. Duplicate ids keep their first occurrence.
    pub fn merge(previous: &[EnrichedFilm], fresh: &[CandidateItem]) -> Self {
        let index: HashMap<ExternalId, &EnrichedFilm> = previous
            .iter()
            .map(|film| (film.external_id, film))
            .collect();

        let mut seen = HashSet::with_capacity(fresh.len());
        let mut films = Vec::with_capacity(fresh.len());

        for candidate in fresh {
            if !seen.insert(candidate.external_id) {
                debug!(
                    external_id = %candidate.external_id,
                    "dropping duplicate candidate"
                );
                continue;
            }

            let mut film = EnrichedFilm::bare(candidate);
            if let Some(cached) = index.get(&candidate.external_id) {
                if let Some(metadata) = &cached.metadata {
                    film.metadata = Some(metadata.clone());
                    film.catalog_id = cached.catalog_id.or(film.catalog_id);
                } else if film.catalog_id.is_none() {
                    film.catalog_id = cached.catalog_id;
                }
                if film.slug.is_none() {
                    film.slug = cached.slug.clone();
                }
            }
            films.push(film);
        }

        Self { films }
    }

    /// Sets `availability_flag` on every film whose external id occurs in
    /// `secondary`, clearing it everywhere else.
    pub fn cross_reference(&mut self, secondary: &[CandidateItem]) {
        let index: HashSet<ExternalId> =
            secondary.iter().map(|item| item.external_id).collect();

        for film in &mut self.films {
            film.availability_flag = index.contains(&film.external_id);
        }
    }

    /// Resolves metadata for every film lacking it, at most `parallelism`
    /// lookups at a time. Failures leave the film untouched.
    pub async fn enrich_missing(
        &mut self,
        provider: &dyn MetadataProvider,
        parallelism: usize,
    ) -> EnrichmentReport {
        let pending: Vec<(usize, EnrichmentRequest)> = self
            .films
            .iter()
            .enumerate()
            .filter(|(_, film)| film.needs_enrichment())
            .map(|(idx, film)| (idx, enrichment_request(film)))
            .collect();

        let mut report = EnrichmentReport {
            attempted: pending.len(),
            ..EnrichmentReport::default()
        };
        if pending.is_empty() {
            return report;
        }

        info!(
            provider = provider.name(),
            pending = pending.len(),
            "enriching films without metadata"
        );

        let results: Vec<(usize, Result<_, ProviderError>)> =
            stream::iter(pending)
                .map(|(idx, request)| async move {
                    (idx, provider.resolve(&request).await)
                })
                .buffer_unordered(parallelism.max(1))
                .collect()
                .await;

        for (idx, result) in results {
            let film = &mut self.films[idx];
            match result {
                Ok(resolved) => {
                    film.attach(resolved.catalog_id, resolved.metadata);
                    report.resolved += 1;
                }
                Err(err) => {
                    warn!(
                        external_id = %film.external_id,
                        title = %film.display_title(),
                        error = %err,
                        "metadata lookup failed"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    pub fn films(&self) -> &[EnrichedFilm] {
        &self.films
    }

    pub fn into_films(self) -> Vec<EnrichedFilm> {
        self.films
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }
}

fn enrichment_request(film: &EnrichedFilm) -> EnrichmentRequest {
    let mut candidate =
        CandidateItem::new(film.external_id, film.source_link.clone());
    candidate.slug = film.slug.clone();
    candidate.catalog_hint = film.catalog_id;
    EnrichmentRequest::new(candidate)
}
