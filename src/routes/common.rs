//! Service routes: liveness, readiness against the data service, build info.

use crate::models::{Mechanics, Products};
use crate::resource::Resource;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::time::Instant;

/// Resource paths mounted by `resource_routes`.
const RESOURCES: [&str; 2] = [Mechanics::PATH, Products::PATH];

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
}

#[derive(Serialize)]
struct Readiness {
    status: &'static str,
    schema: String,
    service: &'static str,
    ping_ms: u128,
}

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    resources: [&'static str; 2],
}

async fn health() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// 200 when the data service answers a ping, 503 otherwise.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let started = Instant::now();
    let outcome = state.service.ping().await.into_result();
    let ping_ms = started.elapsed().as_millis();
    let (code, status, service) = match outcome {
        Ok(_) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            tracing::warn!(schema = %state.schema, error = %e, "data service not ready");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };
    (
        code,
        Json(Readiness {
            status,
            schema: state.schema.to_string(),
            service,
            ping_ms,
        }),
    )
}

async fn version() -> Json<BuildInfo> {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        resources: RESOURCES,
    })
}

pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
