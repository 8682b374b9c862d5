use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::ids::CatalogId;

/// Result of a single named filter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterOutcome {
    pub filter_name: String,
    pub passed: bool,
    pub detail: String,
}

impl FilterOutcome {
    pub fn new(
        filter_name: impl Into<String>,
        passed: bool,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            filter_name: filter_name.into(),
            passed,
            detail: detail.into(),
        }
    }

    /// `name` or `name: detail`, as written to the outcome log.
    pub fn summary(&self) -> String {
        if self.detail.is_empty() {
            self.filter_name.clone()
        } else {
            format!("{}: {}", self.filter_name, self.detail)
        }
    }
}

/// How the `profitable` filter compares revenue against budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProfitPolicy {
    /// `revenue > budget`
    #[default]
    Strict,
    /// `revenue >= budget`
    Inclusive,
}

impl ProfitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfitPolicy::Strict => "strict",
            ProfitPolicy::Inclusive => "inclusive",
        }
    }
}

impl FromStr for ProfitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ProfitPolicy::Strict),
            "inclusive" => Ok(ProfitPolicy::Inclusive),
            other => Err(format!("unknown profit policy `{other}`")),
        }
    }
}

/// Terminal per-item status recorded for every dispatched film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RequestStatus {
    Created,
    AlreadyRequested,
    FilteredOut,
    QuotaReached,
    MissingMetadata,
    ProviderError,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Created,
        RequestStatus::AlreadyRequested,
        RequestStatus::FilteredOut,
        RequestStatus::QuotaReached,
        RequestStatus::MissingMetadata,
        RequestStatus::ProviderError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Created => "CREATED",
            RequestStatus::AlreadyRequested => "ALREADY_REQUESTED",
            RequestStatus::FilteredOut => "FILTERED_OUT",
            RequestStatus::QuotaReached => "QUOTA_REACHED",
            RequestStatus::MissingMetadata => "MISSING_METADATA",
            RequestStatus::ProviderError => "PROVIDER_ERROR",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown request status `{s}`"))
    }
}

/// Status plus free-text detail for one film.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestOutcome {
    pub status: RequestStatus,
    pub detail: String,
}

impl RequestOutcome {
    pub fn new(status: RequestStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn is_created(&self) -> bool {
        self.status == RequestStatus::Created
    }
}

/// One row of the outcome log.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutcomeRecord {
    pub catalog_id: Option<CatalogId>,
    pub title: String,
    pub status: RequestStatus,
    pub detail: String,
}

/// Field of a row read back from the outcome log: integers when they parse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OutcomeValue {
    Integer(i64),
    Text(String),
}

impl OutcomeValue {
    pub fn coerce(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(value) => OutcomeValue::Integer(value),
            Err(_) => OutcomeValue::Text(raw.to_string()),
        }
    }
}

/// Structured view of an outcome log row keyed by header name.
pub type OutcomeRow = BTreeMap<String, OutcomeValue>;
