//! # watchseerr
//!
//! Keeps a media request queue in step with a tracked watchlist.
//!
//! The binary loads configuration, schedules synchronization runs and
//! exposes the last run's outcomes over a small read-only HTTP surface.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use routes::create_app;
