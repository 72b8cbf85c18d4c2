//! API health check endpoint.
//!
//! Used by container orchestrators and CI to verify the service is up. The
//! response names the active storage backend but deliberately does not query
//! it; a degraded backend shows up in the chart endpoints' logs instead.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::loaders::SharedLoader;

// ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

async fn health(State(loader): State<SharedLoader>) -> Json<HealthResponse> {
    // ---
    Json(HealthResponse {
        status: "ok",
        backend: loader.source_name(),
    })
}

pub fn router() -> Router<SharedLoader> {
    // ---
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::loaders::memory::MemoryLoader;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_reports_backend_name() {
        // ---
        let loader: SharedLoader = Arc::new(MemoryLoader::new());
        let response = health(State(loader)).await;
        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.backend, "Memory");
    }
}
