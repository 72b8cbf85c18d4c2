//! Normalization and cleaning of raw recordings.
//!
//! Raw rows arrive with epoch-millisecond timestamps and, occasionally, rows
//! stamped exactly nine hours off by a timezone bug at the collection layer.
//! [`normalize`] produces the canonical local-time frame; [`clean`] erases the
//! nine-hour poison rows by fixed-point iteration.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::PipelineError;
use crate::models::{Mode, RawReading, Recording, SensorReading};

// ---

/// All capture devices report in Korea Standard Time (UTC+9, no DST).
const KST_OFFSET_SECS: i64 = 9 * 3600;

/// Consecutive-row deltas that mark a timezone artifact, in nanoseconds:
/// exactly 9h and exactly 9h + 1s.
pub const ANOMALY_DELTAS_NS: [i64; 2] = [32_400_000_000_000, 32_401_000_000_000];

/// Convert an epoch-millisecond instant to KST wall-clock time, truncated to
/// whole seconds. Sub-second resolution is deliberately discarded here and is
/// not recoverable downstream.
fn to_local_second(epoch_ms: i64) -> Option<NaiveDateTime> {
    let secs = epoch_ms.div_euclid(1000);
    Some(DateTime::<Utc>::from_timestamp(secs.checked_add(KST_OFFSET_SECS)?, 0)?.naive_utc())
}

/// Build the canonical frame from a raw batch.
///
/// Rows are stably sorted by raw `time` (so same-second ties keep their
/// original order), converted to local one-second timestamps, and de-duplicated
/// keep-first on the timestamp. Returns [`PipelineError::NoData`] for an empty
/// batch and [`PipelineError::SchemaMismatch`] for epoch values no calendar
/// instant can represent.
pub fn normalize(mut raw: Vec<RawReading>, mode: Mode) -> Result<Recording, PipelineError> {
    // ---
    if raw.is_empty() {
        return Err(PipelineError::NoData);
    }

    raw.sort_by_key(|r| r.time);

    let mut rows = Vec::with_capacity(raw.len());
    for r in raw {
        let timestamp = to_local_second(r.time).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!("epoch value {} is out of range", r.time))
        })?;
        rows.push(SensorReading {
            timestamp,
            sensor_id: r.sensor_id,
            accel_x: r.accel_x,
            accel_y: r.accel_y,
            accel_z: r.accel_z,
            gyro_x: r.gyro_x,
            gyro_y: r.gyro_y,
            gyro_z: r.gyro_z,
            pitch: r.pitch,
            roll: r.roll,
            lat: r.lat,
            lon: r.lon,
            vel: r.velocity,
            alt: r.altitude,
            head: r.bearing,
            trip_elapsed_ms: r.trip_elapsed_ms,
            trip_distance_m: r.trip_distance_m,
        });
    }

    // Keep the chronologically-first row of every one-second bucket.
    rows.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);

    Ok(Recording { mode, rows })
}

/// Indices of rows whose delta to the previous row equals one of the
/// nine-hour artifact constants.
fn anomaly_indices(rows: &[SensorReading]) -> Vec<usize> {
    // ---
    rows.windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let delta = (pair[1].timestamp - pair[0].timestamp).num_nanoseconds()?;
            ANOMALY_DELTAS_NS.contains(&delta).then_some(i + 1)
        })
        .collect()
}

/// Remove timezone-artifact rows until none remain.
///
/// Dropping a row can expose a new qualifying delta between its former
/// neighbors, so one scan is not enough; the scan repeats until a fixed point.
/// Each pass removes at least one row, so the loop is bounded by the input
/// length; exceeding that bound is reported as a data-quality failure rather
/// than looping forever.
pub fn clean(rec: Recording) -> Result<Recording, PipelineError> {
    // ---
    let Recording { mode, mut rows } = rec;

    let max_passes = rows.len();
    for _ in 0..=max_passes {
        let drop = anomaly_indices(&rows);
        if drop.is_empty() {
            return Ok(Recording { mode, rows });
        }

        tracing::debug!("dropping {} timezone-artifact rows", drop.len());

        let mut idx = 0;
        let mut next = 0;
        rows.retain(|_| {
            let remove = next < drop.len() && drop[next] == idx;
            if remove {
                next += 1;
            }
            idx += 1;
            !remove
        });
    }

    Err(PipelineError::DataQuality(
        "timezone-anomaly cleaning did not reach a fixed point".into(),
    ))
}
