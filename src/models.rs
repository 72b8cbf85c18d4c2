//! Data models for the ride sensor dashboard.
//!
//! `RawReading` mirrors the wire contract shared by both storage backends;
//! `SensorReading` is the canonical per-row shape every downstream transform
//! (cleaning, aggregation, track classification) operates on.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---

/// Which capture namespace to query. BLE and LTE recordings live in separate
/// databases/buckets and differ by the two trailing trip-counter fields that
/// only LTE devices report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Ble,
    Lte,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ble => "ble",
            Mode::Lte => "lte",
        }
    }
}

/// One raw row as stored by a backend.
///
/// Only `time` is required; devices occasionally upload partial rows, and the
/// object-store variant can be missing whole columns. Those gaps survive as
/// `None` and are skipped during aggregation rather than rejected up front.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    /// Capture instant, epoch milliseconds.
    pub time: i64,

    #[serde(default)]
    pub sensor_id: Option<String>,

    #[serde(rename = "ACCEL_X", default)]
    pub accel_x: Option<f64>,
    #[serde(rename = "ACCEL_Y", default)]
    pub accel_y: Option<f64>,
    #[serde(rename = "ACCEL_Z", default)]
    pub accel_z: Option<f64>,

    #[serde(rename = "GYRO_X", default)]
    pub gyro_x: Option<f64>,
    #[serde(rename = "GYRO_Y", default)]
    pub gyro_y: Option<f64>,
    #[serde(rename = "GYRO_Z", default)]
    pub gyro_z: Option<f64>,

    #[serde(rename = "PITCH", default)]
    pub pitch: Option<f64>,
    #[serde(rename = "ROLL", default)]
    pub roll: Option<f64>,

    #[serde(rename = "LAT", default)]
    pub lat: Option<f64>,
    #[serde(rename = "LON", default)]
    pub lon: Option<f64>,

    #[serde(rename = "VELOCITY", default)]
    pub velocity: Option<f64>,
    #[serde(rename = "ALTITUDE", default)]
    pub altitude: Option<f64>,
    #[serde(rename = "BEARING", default)]
    pub bearing: Option<f64>,

    /// Cumulative trip time in milliseconds (LTE only).
    #[serde(rename = "TIME", default)]
    pub trip_elapsed_ms: Option<i64>,
    /// Cumulative trip distance in meters (LTE only).
    #[serde(rename = "DISTANCE", default)]
    pub trip_distance_m: Option<f64>,
}

/// One canonical row after normalization.
///
/// The timestamp is Asia/Seoul local time truncated to whole seconds; the
/// channel fields keep the `Option` gaps from [`RawReading`].
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub timestamp: NaiveDateTime,
    pub sensor_id: Option<String>,

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

    pub trip_elapsed_ms: Option<i64>,
    pub trip_distance_m: Option<f64>,
}

/// One (date, phone, sensor) recording in canonical form.
///
/// Read-only once built; every query reconstructs it from the backend. After
/// [`crate::processing::clean`] the timestamps are strictly increasing.
#[derive(Debug, Clone)]
pub struct Recording {
    pub mode: Mode,
    pub rows: Vec<SensorReading>,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Final cumulative trip totals (LTE recordings only). `None` when the
    /// recording is empty or the last row carries no counters.
    pub fn trip_totals(&self) -> Option<TripTotals> {
        let last = self.rows.last()?;
        Some(TripTotals {
            elapsed_ms: last.trip_elapsed_ms?,
            distance_m: last.trip_distance_m?,
        })
    }
}

/// Final trip counters from the last row of an LTE recording. Already
/// monotonic totals upstream; surfaced as-is, no aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripTotals {
    pub elapsed_ms: i64,
    pub distance_m: f64,
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn reading_at(ts: NaiveDateTime) -> SensorReading {
        // ---
        SensorReading {
            timestamp: ts,
            sensor_id: Some("SENSOR0001".into()),
            accel_x: Some(0.1),
            accel_y: Some(0.2),
            accel_z: Some(9.8),
            gyro_x: Some(0.0),
            gyro_y: Some(0.0),
            gyro_z: Some(0.0),
            pitch: Some(1.0),
            roll: Some(-1.0),
            lat: Some(37.5),
            lon: Some(127.0),
            vel: Some(4.2),
            alt: Some(30.0),
            head: Some(90.0),
            trip_elapsed_ms: None,
            trip_distance_m: None,
        }
    }

    #[test]
    fn trip_totals_require_both_counters() {
        // ---
        let ts = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let mut row = reading_at(ts);
        row.trip_elapsed_ms = Some(120_000);
        let rec = Recording {
            mode: Mode::Lte,
            rows: vec![row.clone()],
        };
        // Distance missing, so no summary.
        assert!(rec.trip_totals().is_none());

        row.trip_distance_m = Some(512.5);
        let rec = Recording {
            mode: Mode::Lte,
            rows: vec![row],
        };
        let totals = rec.trip_totals().unwrap();
        assert_eq!(totals.elapsed_ms, 120_000);
        assert_eq!(totals.distance_m, 512.5);
    }

    #[test]
    fn trip_totals_empty_recording() {
        // ---
        let rec = Recording {
            mode: Mode::Lte,
            rows: vec![],
        };
        assert!(rec.trip_totals().is_none());
    }

    #[test]
    fn mode_query_param_spelling() {
        // ---
        assert_eq!(serde_json::to_string(&Mode::Ble).unwrap(), "\"ble\"");
        assert_eq!(serde_json::from_str::<Mode>("\"lte\"").unwrap(), Mode::Lte);
    }
}
