use crate::ids::{CatalogId, ExternalId};

/// A raw watchlist entry as observed during the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateItem {
    pub external_id: ExternalId,
    pub source_link: String,
    /// Human readable slug, only used for logs.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub slug: Option<String>,
    /// Catalog id when the source already exposes it.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub catalog_hint: Option<CatalogId>,
    /// Membership in the secondary list, when the source reports it inline.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub in_secondary: Option<bool>,
}

impl CandidateItem {
    pub fn new(external_id: ExternalId, source_link: impl Into<String>) -> Self {
        Self {
            external_id,
            source_link: source_link.into(),
            slug: None,
            catalog_hint: None,
            in_secondary: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_catalog_hint(mut self, catalog_id: CatalogId) -> Self {
        self.catalog_hint = Some(catalog_id);
        self
    }

    pub fn with_secondary_membership(mut self, member: bool) -> Self {
        self.in_secondary = Some(member);
        self
    }
}

/// Catalog metadata attached to a film once it has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilmMetadata {
    pub title: String,
    pub budget: u64,
    pub revenue: u64,
    /// ISO-8601 date as reported by the catalog; may be empty.
    pub release_date: String,
}

/// A ledger record: one watchlist film and whatever has been learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnrichedFilm {
    pub external_id: ExternalId,
    pub source_link: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slug: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub catalog_id: Option<CatalogId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: Option<FilmMetadata>,
    /// Recomputed every run from the secondary list.
    #[cfg_attr(feature = "serde", serde(default))]
    pub availability_flag: bool,
}

impl EnrichedFilm {
    /// Bare record for a candidate that still needs enrichment.
    pub fn bare(candidate: &CandidateItem) -> Self {
        Self {
            external_id: candidate.external_id,
            source_link: candidate.source_link.clone(),
            slug: candidate.slug.clone(),
            catalog_id: candidate.catalog_hint,
            metadata: None,
            availability_flag: false,
        }
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn needs_enrichment(&self) -> bool {
        self.metadata.is_none()
    }

    pub fn attach(&mut self, catalog_id: CatalogId, metadata: FilmMetadata) {
        self.catalog_id = Some(catalog_id);
        self.metadata = Some(metadata);
    }

    /// Best label available for logs and the outcome log.
    pub fn display_title(&self) -> String {
        if let Some(metadata) = &self.metadata {
            return metadata.title.clone();
        }
        match &self.slug {
            Some(slug) => slug.clone(),
            None => format!("external:{}", self.external_id),
        }
    }
}
