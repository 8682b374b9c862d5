//! Watchlist reconciliation and request dispatch.
//!
//! A run pulls the tracked watchlist from a [`providers::CandidateSource`],
//! merges it with the previous [`ledger::FilmLedger`] snapshot, fills in
//! catalog metadata, runs the configured [`filters::FilterChain`] and files
//! media requests through the [`dispatcher::RequestDispatcher`].
#![allow(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod filters;
pub mod ledger;
pub mod orchestrator;
pub mod persistence;
pub mod providers;
pub mod scheduler;

pub use dispatcher::{
    DispatcherSettings, RefreshPolicy, RequestDispatcher, RunState,
};
pub use error::{Result, SyncError};
pub use filters::{ChainVerdict, FilterChain, FilterContext, FilterKind};
pub use ledger::{EnrichmentReport, FilmLedger};
pub use orchestrator::{
    RunContext, RunSummary, SyncOrchestrator, SyncServices, SyncSettings,
    SyncStores,
};
pub use persistence::{LedgerStore, OutcomeLog, PersistenceError};
pub use scheduler::{SyncRunner, SyncScheduler, TriggerOutcome};
