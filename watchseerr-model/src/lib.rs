//! Core data model definitions shared across watchseerr crates.
#![allow(missing_docs)]

pub mod film;
pub mod ids;
pub mod outcome;

pub use film::{CandidateItem, EnrichedFilm, FilmMetadata};
pub use ids::{CatalogId, ExternalId};
pub use outcome::{
    FilterOutcome, OutcomeRecord, OutcomeRow, OutcomeValue, ProfitPolicy,
    RequestOutcome, RequestStatus,
};
