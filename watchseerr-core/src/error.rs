use thiserror::Error;

use crate::providers::SourceError;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Run cannot start: unusable data directory, bad schedule, client
    /// construction failure.
    #[error("Setup error: {0}")]
    Setup(String),

    /// Candidate lists could not be fetched; previous snapshots are kept.
    #[error("Scrape error: {0}")]
    Scrape(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
