//! Map overlay endpoint.
//!
//! Runs the same pipeline as the chart endpoint, then classifies the GPS
//! track into jump / sensor-disconnected / healthy point sets plus a map
//! center for the tile view.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{classify_track, GeoPoint};
use crate::loaders::SharedLoader;
use crate::query::load_cleaned;
use crate::routes::{log_no_data, SelectionQuery};

// ---

pub fn router() -> Router<SharedLoader> {
    // ---
    Router::new().route("/api/track", get(handler))
}

#[derive(Debug, Serialize)]
struct TrackResponse {
    status: &'static str,
    jumps: Vec<GeoPoint>,
    disconnected: Vec<GeoPoint>,
    healthy: Vec<GeoPoint>,
    center: Option<GeoPoint>,
}

impl TrackResponse {
    fn no_data() -> Self {
        // ---
        TrackResponse {
            status: "no_data",
            jumps: Vec::new(),
            disconnected: Vec::new(),
            healthy: Vec::new(),
            center: None,
        }
    }
}

async fn handler(
    Query(q): Query<SelectionQuery>,
    State(loader): State<SharedLoader>,
) -> Json<TrackResponse> {
    // ---
    let Some(sel) = q.into_selection() else {
        debug!("track request with incomplete selection; no-op");
        return Json(TrackResponse::no_data());
    };

    info!(
        "GET /api/track {}/{}/{} mode={}",
        sel.date,
        sel.phone,
        sel.sensor,
        sel.mode.as_str()
    );

    let result = load_cleaned(loader.as_ref(), &sel)
        .await
        .and_then(|rec| classify_track(&rec));

    match result {
        Ok(overlay) => Json(TrackResponse {
            status: "ok",
            jumps: overlay.jumps,
            disconnected: overlay.disconnected,
            healthy: overlay.healthy,
            center: Some(overlay.center),
        }),
        Err(e) => {
            log_no_data("GET /api/track", &e);
            Json(TrackResponse::no_data())
        }
    }
}
