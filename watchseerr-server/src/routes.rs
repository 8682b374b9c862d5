use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{handlers, infra::app_context::AppContext};

pub const REQUESTS: &str = "/requests";
pub const HEALTH: &str = "/health";

pub fn create_app(ctx: AppContext) -> Router {
    Router::new()
        .route(REQUESTS, get(handlers::list_requests))
        .route(HEALTH, get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
