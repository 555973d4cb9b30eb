//! Health and readiness endpoint.
//!
//! 200 OK when PostgreSQL and Redis are both reachable, 503 otherwise.
//! The body also reports editor-level signals (registered block types,
//! L1 cache occupancy) so a probe can tell a cold instance from a broken
//! one.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    postgres: bool,
    redis: bool,
    block_types: usize,
    cached_views: u64,
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (postgres, redis) = tokio::join!(state.postgres_healthy(), state.redis_healthy());
    let cache_stats = state.cache().stats().await;

    let healthy = postgres && redis;

    (
        if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            postgres,
            redis,
            block_types: state.editor().registry().len(),
            cached_views: cache_stats.l1_entry_count,
        }),
    )
}

/// Create the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
