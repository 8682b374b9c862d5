//! Ordered, short-circuiting request filters.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use tracing::warn;
use watchseerr_model::{EnrichedFilm, FilterOutcome, ProfitPolicy};

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";
const MISSING_METADATA: &str = "missing metadata";

/// Inputs shared by every filter evaluation in a run.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub now: DateTime<Utc>,
    pub profit_policy: ProfitPolicy,
}

impl FilterContext {
    pub fn new(now: DateTime<Utc>, profit_policy: ProfitPolicy) -> Self {
        Self { now, profit_policy }
    }

    pub fn current(profit_policy: ProfitPolicy) -> Self {
        Self::new(Utc::now(), profit_policy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Never passes; exercises the pipeline without dispatching.
    DryRun,
    /// Passes only when the film is not on a favorite streaming service.
    VodNotAvailable,
    Profitable,
    /// Release date parses and lies strictly in the past.
    Released,
}

const FILTER_TABLE: [(&str, FilterKind); 4] = [
    ("dry_run", FilterKind::DryRun),
    ("vod_not_available", FilterKind::VodNotAvailable),
    ("profitable", FilterKind::Profitable),
    ("released", FilterKind::Released),
];

impl FilterKind {
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        FILTER_TABLE
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::DryRun => "dry_run",
            FilterKind::VodNotAvailable => "vod_not_available",
            FilterKind::Profitable => "profitable",
            FilterKind::Released => "released",
        }
    }

    pub fn known_names() -> impl Iterator<Item = &'static str> {
        FILTER_TABLE.iter().map(|(name, _)| *name)
    }

    /// Pure predicate; returns `(passed, detail)`.
    pub fn evaluate(
        &self,
        film: &EnrichedFilm,
        ctx: &FilterContext,
    ) -> (bool, String) {
        match self {
            FilterKind::DryRun => (false, String::new()),
            FilterKind::VodNotAvailable => {
                (!film.availability_flag, String::new())
            }
            FilterKind::Profitable => {
                let Some(metadata) = &film.metadata else {
                    return (false, MISSING_METADATA.to_string());
                };
                let (budget, revenue) = (metadata.budget, metadata.revenue);
                let covers_budget = match ctx.profit_policy {
                    ProfitPolicy::Strict => revenue > budget,
                    ProfitPolicy::Inclusive => revenue >= budget,
                };
                (
                    covers_budget && budget > 0,
                    format!("bud:{budget}, rev={revenue}"),
                )
            }
            FilterKind::Released => {
                let Some(metadata) = &film.metadata else {
                    return (false, MISSING_METADATA.to_string());
                };
                match NaiveDate::parse_from_str(
                    metadata.release_date.trim(),
                    RELEASE_DATE_FORMAT,
                ) {
                    Ok(date) => {
                        let released = date
                            .and_hms_opt(0, 0, 0)
                            .map(|midnight| midnight.and_utc() < ctx.now)
                            .unwrap_or(false);
                        (
                            released,
                            format!("release date: {}", metadata.release_date),
                        )
                    }
                    Err(_) => {
                        (false, "failed to parse release date".to_string())
                    }
                }
            }
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of running the whole chain on one film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerdict {
    Passed,
    /// The first failing filter, with its detail.
    Rejected(FilterOutcome),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<FilterKind>,
}

impl FilterChain {
    pub fn new(filters: Vec<FilterKind>) -> Self {
        Self { filters }
    }

    /// Builds a chain in configured order. Unknown names are logged and
    /// left out; they are also returned so callers can surface them.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> (Self, Vec<String>) {
        let mut filters = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();

        for name in names {
            let name = name.as_ref();
            match FilterKind::lookup(name) {
                Some(kind) => filters.push(kind),
                None => {
                    warn!(
                        filter = name,
                        known = ?FilterKind::known_names().collect::<Vec<_>>(),
                        "ignoring unknown request filter"
                    );
                    unknown.push(name.to_string());
                }
            }
        }

        (Self { filters }, unknown)
    }

    pub fn filters(&self) -> &[FilterKind] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluates filters in order and stops at the first failure.
    pub fn evaluate(
        &self,
        film: &EnrichedFilm,
        ctx: &FilterContext,
    ) -> ChainVerdict {
        for kind in &self.filters {
            let (passed, detail) = kind.evaluate(film, ctx);
            if !passed {
                return ChainVerdict::Rejected(FilterOutcome::new(
                    kind.name(),
                    false,
                    detail,
                ));
            }
        }
        ChainVerdict::Passed
    }
}
