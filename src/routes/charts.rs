//! Chart data endpoint.
//!
//! One request runs the whole pipeline — load, normalize, clean, aggregate —
//! and returns every chart series the dashboard draws: the samples-per-second
//! histogram, the accel/gyro/attitude mean series, the velocity series, and
//! (LTE only) the final trip totals.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{self, HISTOGRAM_DISPLAY_RANGE};
use crate::error::PipelineError;
use crate::loaders::SharedLoader;
use crate::models::{Mode, Recording, TripTotals};
use crate::query::load_cleaned;
use crate::routes::{log_no_data, SelectionQuery};

// ---

pub fn router() -> Router<SharedLoader> {
    // ---
    Router::new().route("/api/charts", get(handler))
}

/// Everything the chart panel needs, as plain series. A failed or empty query
/// comes back with `status: "no_data"` and empty series — the UI shows its
/// "no data available" banner, never an error page.
#[derive(Debug, Serialize)]
struct ChartsResponse {
    status: &'static str,
    /// Samples-per-second histogram as `[k, windows_with_k_samples]` pairs.
    histogram: Vec<(usize, usize)>,
    /// Default x-axis window for the histogram chart.
    histogram_display_range: [usize; 2],
    /// X axis for the mean series, `YYYY-MM-DD HH:MM:SS`.
    timestamps: Vec<String>,
    accel_x: Vec<Option<f64>>,
    accel_y: Vec<Option<f64>>,
    accel_z: Vec<Option<f64>>,
    gyro_x: Vec<Option<f64>>,
    gyro_y: Vec<Option<f64>>,
    gyro_z: Vec<Option<f64>>,
    pitch: Vec<Option<f64>>,
    roll: Vec<Option<f64>>,
    /// X axis for the velocity series; per-row for LTE, per-timestamp for BLE.
    velocity_timestamps: Vec<String>,
    velocity: Vec<Option<f64>>,
    trip: Option<TripTotals>,
}

impl ChartsResponse {
    fn no_data() -> Self {
        // ---
        ChartsResponse {
            status: "no_data",
            histogram: Vec::new(),
            histogram_display_range: HISTOGRAM_DISPLAY_RANGE,
            timestamps: Vec::new(),
            accel_x: Vec::new(),
            accel_y: Vec::new(),
            accel_z: Vec::new(),
            gyro_x: Vec::new(),
            gyro_y: Vec::new(),
            gyro_z: Vec::new(),
            pitch: Vec::new(),
            roll: Vec::new(),
            velocity_timestamps: Vec::new(),
            velocity: Vec::new(),
            trip: None,
        }
    }
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

async fn handler(
    Query(q): Query<SelectionQuery>,
    State(loader): State<SharedLoader>,
) -> Json<ChartsResponse> {
    // ---
    let Some(sel) = q.into_selection() else {
        debug!("chart request with incomplete selection; no-op");
        return Json(ChartsResponse::no_data());
    };

    info!(
        "GET /api/charts {}/{}/{} mode={}",
        sel.date,
        sel.phone,
        sel.sensor,
        sel.mode.as_str()
    );

    let result = load_cleaned(loader.as_ref(), &sel)
        .await
        .and_then(|rec| build_charts(&rec));

    match result {
        Ok(response) => Json(response),
        Err(e) => {
            log_no_data("GET /api/charts", &e);
            Json(ChartsResponse::no_data())
        }
    }
}

fn build_charts(rec: &Recording) -> Result<ChartsResponse, PipelineError> {
    // ---
    let histogram = analysis::sample_rate_histogram(rec)?;
    let means = analysis::channel_means(rec)?;

    // LTE velocity arrives pre-smoothed upstream, so it is charted from the
    // raw per-row values rather than the per-timestamp means.
    let (velocity_timestamps, velocity) = match rec.mode {
        Mode::Lte => rec
            .rows
            .iter()
            .map(|r| (fmt_ts(r.timestamp), r.vel))
            .unzip(),
        Mode::Ble => means.iter().map(|m| (fmt_ts(m.timestamp), m.vel)).unzip(),
    };

    let trip = match rec.mode {
        Mode::Lte => rec.trip_totals(),
        Mode::Ble => None,
    };

    Ok(ChartsResponse {
        status: "ok",
        histogram: histogram.into_iter().collect(),
        histogram_display_range: HISTOGRAM_DISPLAY_RANGE,
        timestamps: means.iter().map(|m| fmt_ts(m.timestamp)).collect(),
        accel_x: means.iter().map(|m| m.accel_x).collect(),
        accel_y: means.iter().map(|m| m.accel_y).collect(),
        accel_z: means.iter().map(|m| m.accel_z).collect(),
        gyro_x: means.iter().map(|m| m.gyro_x).collect(),
        gyro_y: means.iter().map(|m| m.gyro_y).collect(),
        gyro_z: means.iter().map(|m| m.gyro_z).collect(),
        pitch: means.iter().map(|m| m.pitch).collect(),
        roll: means.iter().map(|m| m.roll).collect(),
        velocity_timestamps,
        velocity,
        trip,
    })
}
