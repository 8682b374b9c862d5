pub mod app_context;
pub mod errors;
pub mod startup;
pub mod telemetry;
