use std::{fmt, sync::Arc};

use watchseerr_core::{OutcomeLog, SyncRunner};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppContext {
    outcomes: OutcomeLog,
    runner: Option<Arc<SyncRunner>>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("outcomes", &self.outcomes.path())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn new(outcomes: OutcomeLog, runner: Option<Arc<SyncRunner>>) -> Self {
        Self { outcomes, runner }
    }

    pub fn outcomes(&self) -> &OutcomeLog {
        &self.outcomes
    }

    /// `None` when no runner is attached to this process.
    pub fn sync_running(&self) -> Option<bool> {
        self.runner.as_ref().map(|runner| runner.is_running())
    }
}
