//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Cache round-trip plus notification queue depth and dead-letter count

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use taskhub_core::cache::CacheError;
use taskhub_core::queue::QueueError;

use crate::state::AppState;

/// Key written and read back by the cache check.
const HEALTH_CHECK_KEY: &str = "healthz";
const HEALTH_CHECK_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct QueueHealth {
    pending: usize,
    dead_letters: usize,
}

#[derive(Debug, Serialize)]
struct CacheHealth {
    healthy: bool,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Cache and notification queue checks.
///
/// Returns 503 when either backend cannot be reached.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    let cache = check_cache(&state).await;
    let queue = async {
        let pending = state.queue.pending_count().await?;
        let dead_letters = state.queue.dead_letters().await?.len();
        Ok::<_, QueueError>(QueueHealth {
            pending,
            dead_letters,
        })
    }
    .await;

    match queue {
        Ok(queue) if cache.healthy => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "cache": cache, "queue": queue })),
        )
            .into_response(),
        Ok(queue) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable", "cache": cache, "queue": queue })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unavailable",
                "cache": cache,
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

/// Writes, reads back and removes a marker entry.
async fn check_cache(state: &AppState) -> CacheHealth {
    let started = Instant::now();
    let marker = Uuid::new_v4().to_string().into_bytes();

    let result = async {
        state
            .cache
            .set(HEALTH_CHECK_KEY, &marker, Some(HEALTH_CHECK_TTL))
            .await?;
        let read = state.cache.get(HEALTH_CHECK_KEY).await?;
        state.cache.delete(HEALTH_CHECK_KEY).await?;
        Ok::<_, CacheError>(read)
    }
    .await;

    let latency_ms = started.elapsed().as_millis() as u64;
    let error = match result {
        Ok(Some(read)) if read == marker => None,
        Ok(_) => Some("cache did not return the value just written".to_string()),
        Err(err) => Some(err.to_string()),
    };

    if let Some(error) = &error {
        tracing::warn!(error = %error, latency_ms, "Cache health check failed");
    }

    CacheHealth {
        healthy: error.is_none(),
        latency_ms,
        error,
    }
}
