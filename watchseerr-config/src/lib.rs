//! Configuration loading for the watchseerr sync service.
//!
//! Values come from a TOML file, an optional `.env` file and the process
//! environment, in increasing order of precedence.
#![allow(missing_docs)]

pub mod cadence;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use cadence::{Cadence, CadenceError, CronExpression};
pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    CatalogConfig, Config, ConfigMetadata, RequestsConfig, Secret,
    ServerConfig, SourceConfig, StorageConfig, TasksConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};
