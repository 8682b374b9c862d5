pub mod seerr;
pub mod source;
pub mod tmdb;
pub mod traits;

#[cfg(test)]
pub use traits::MockMetadataProvider;
pub use seerr::SeerrClient;
pub use source::HttpCandidateSource;
pub use tmdb::TmdbProvider;
pub use traits::{
    CandidateSource, EnrichmentRequest, MetadataProvider, ProviderError,
    RequestService, ResolvedFilm, SourceError,
};
