//! On-disk ledger snapshot and outcome log.

mod atomic;
pub mod ledger_store;
pub mod outcome_log;

pub use ledger_store::LedgerStore;
pub use outcome_log::{OUTCOME_HEADER, OutcomeLog};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ledger JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid outcome CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
