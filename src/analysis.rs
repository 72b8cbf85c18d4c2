//! Derived metrics over a cleaned recording.
//!
//! Two consumers: the chart endpoints (per-second sample-rate histogram and
//! per-timestamp channel means) and the map endpoint (GPS track classified
//! into jump / sensor-disconnected / healthy points).

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::PipelineError;
use crate::models::Recording;

// ---

/// Default x-axis window for the samples-per-second histogram. Values outside
/// the band are still computed; the UI just does not show them by default.
pub const HISTOGRAM_DISPLAY_RANGE: [usize; 2] = [10, 50];

/// Squared-displacement threshold for a GPS jump, in degrees (~300 m here).
/// Fixed heuristic policy; not tunable.
pub const JUMP_THRESHOLD_DEG: f64 = 0.003;

/// Mean of every numeric channel within one one-second timestamp group.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeans {
    pub timestamp: NaiveDateTime,
    pub accel_x: Option<f64>,
    pub accel_y: Option<f64>,
    pub accel_z: Option<f64>,
    pub gyro_x: Option<f64>,
    pub gyro_y: Option<f64>,
    pub gyro_z: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub vel: Option<f64>,
    pub alt: Option<f64>,
    pub head: Option<f64>,
}

/// One GPS fix rendered on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Classified point sets for the map overlays, plus the map center.
#[derive(Debug, Clone, Serialize)]
pub struct TrackOverlay {
    pub jumps: Vec<GeoPoint>,
    pub disconnected: Vec<GeoPoint>,
    pub healthy: Vec<GeoPoint>,
    pub center: GeoPoint,
}

// ---

/// Mean over the present values; `None` when every value is absent.
fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.into_iter().flatten() {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

/// Samples-per-second histogram: per-timestamp row count, then count of
/// counts. `histogram[k]` answers "how many one-second windows held exactly
/// `k` samples"; the values sum to the number of distinct timestamps.
pub fn sample_rate_histogram(rec: &Recording) -> Result<BTreeMap<usize, usize>, PipelineError> {
    // ---
    if rec.is_empty() {
        return Err(PipelineError::NoData);
    }

    let mut histogram = BTreeMap::new();
    for group in rec.rows.chunk_by(|a, b| a.timestamp == b.timestamp) {
        *histogram.entry(group.len()).or_insert(0) += 1;
    }
    Ok(histogram)
}

/// Per-timestamp means of every numeric channel, ascending by timestamp.
/// Absent values within a group are skipped, not treated as zero.
pub fn channel_means(rec: &Recording) -> Result<Vec<ChannelMeans>, PipelineError> {
    // ---
    if rec.is_empty() {
        return Err(PipelineError::NoData);
    }

    let mut out = Vec::new();
    for group in rec.rows.chunk_by(|a, b| a.timestamp == b.timestamp) {
        out.push(ChannelMeans {
            timestamp: group[0].timestamp,
            accel_x: mean(group.iter().map(|r| r.accel_x)),
            accel_y: mean(group.iter().map(|r| r.accel_y)),
            accel_z: mean(group.iter().map(|r| r.accel_z)),
            gyro_x: mean(group.iter().map(|r| r.gyro_x)),
            gyro_y: mean(group.iter().map(|r| r.gyro_y)),
            gyro_z: mean(group.iter().map(|r| r.gyro_z)),
            pitch: mean(group.iter().map(|r| r.pitch)),
            roll: mean(group.iter().map(|r| r.roll)),
            lat: mean(group.iter().map(|r| r.lat)),
            lon: mean(group.iter().map(|r| r.lon)),
            vel: mean(group.iter().map(|r| r.vel)),
            alt: mean(group.iter().map(|r| r.alt)),
            head: mean(group.iter().map(|r| r.head)),
        });
    }
    Ok(out)
}

struct Fix {
    point: GeoPoint,
    accel: [Option<f64>; 3],
}

/// Classify the recording's GPS track for the map overlays.
///
/// Fixes are de-duplicated globally on the exact (lat, lon) pair keep-first.
/// For each adjacent pair, the leading point is a JUMP when the squared
/// displacement reaches the threshold; otherwise an exactly-zero accelerometer
/// triple marks a disconnected sensor, and anything else (including missing
/// accelerometer fields) is healthy. The center is the middle fix.
pub fn classify_track(rec: &Recording) -> Result<TrackOverlay, PipelineError> {
    // ---
    if rec.is_empty() {
        return Err(PipelineError::NoData);
    }

    let mut seen = HashSet::new();
    let mut fixes = Vec::new();
    for row in &rec.rows {
        let (Some(lat), Some(lon)) = (row.lat, row.lon) else {
            continue;
        };
        if seen.insert((lat.to_bits(), lon.to_bits())) {
            fixes.push(Fix {
                point: GeoPoint { lat, lon },
                accel: [row.accel_x, row.accel_y, row.accel_z],
            });
        }
    }

    if fixes.is_empty() {
        return Err(PipelineError::NoData);
    }

    let center = fixes[fixes.len() / 2].point;

    let mut jumps = Vec::new();
    let mut disconnected = Vec::new();
    let mut healthy = Vec::new();

    for pair in fixes.windows(2) {
        let d_lat = pair[1].point.lat - pair[0].point.lat;
        let d_lon = pair[1].point.lon - pair[0].point.lon;

        if d_lat * d_lat + d_lon * d_lon >= JUMP_THRESHOLD_DEG * JUMP_THRESHOLD_DEG {
            jumps.push(pair[0].point);
        } else {
            match pair[0].accel {
                [Some(x), Some(y), Some(z)] if x == 0.0 && y == 0.0 && z == 0.0 => {
                    disconnected.push(pair[0].point)
                }
                _ => healthy.push(pair[0].point),
            }
        }
    }

    Ok(TrackOverlay {
        jumps,
        disconnected,
        healthy,
        center,
    })
}
