use async_trait::async_trait;
use std::collections::HashSet;
use watchseerr_model::{CandidateItem, CatalogId, FilmMetadata};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("candidate source rejected the credentials")]
    Unauthorized,

    #[error("candidate source unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("candidate source returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("candidate source payload invalid: {0}")]
    Parse(String),
}

/// Catalog metadata resolved for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilm {
    pub catalog_id: CatalogId,
    pub metadata: FilmMetadata,
}

/// Everything a catalog lookup may use to identify a film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRequest {
    pub candidate: CandidateItem,
    /// Catalog id already known for this film, if any.
    pub catalog_id: Option<CatalogId>,
}

impl EnrichmentRequest {
    pub fn new(candidate: CandidateItem) -> Self {
        let catalog_id = candidate.catalog_hint;
        Self {
            candidate,
            catalog_id,
        }
    }
}

/// Resolves a raw candidate to catalog metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn resolve(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<ResolvedFilm, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Downstream media-request service.
#[async_trait]
pub trait RequestService: Send + Sync {
    /// Catalog ids that already carry an active request.
    async fn list_already_requested(
        &self,
    ) -> Result<HashSet<CatalogId>, ProviderError>;

    /// Creates a movie request; `Ok` only when the service accepted it.
    async fn create_request(
        &self,
        catalog_id: CatalogId,
    ) -> Result<(), ProviderError>;
}

/// Opaque producer of raw candidate records.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn list(
        &self,
        endpoint: &str,
    ) -> Result<Vec<CandidateItem>, SourceError>;
}
