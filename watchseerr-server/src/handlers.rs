use axum::{Json, extract::State};
use serde_json::{Value, json};
use watchseerr_model::OutcomeRow;

use crate::infra::{app_context::AppContext, errors::AppResult};

/// Last run's outcome log as JSON records.
pub async fn list_requests(
    State(ctx): State<AppContext>,
) -> AppResult<Json<Vec<OutcomeRow>>> {
    let log = ctx.outcomes().clone();
    let rows = tokio::task::spawn_blocking(move || log.read()).await??;
    Ok(Json(rows))
}

pub async fn health(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sync_running": ctx.sync_running(),
    }))
}
