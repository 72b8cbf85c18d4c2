//! Object-store backend.
//!
//! Recordings are Parquet objects keyed `{date}/{sensor}_{phone}_{date}.parquet`
//! in per-mode buckets. The catalog is derived from key listings: dates from
//! top-level prefixes, phones and sensors parsed out of object names. Objects
//! are fetched whole and decoded in memory; recordings are a few thousand rows.

use std::collections::BTreeSet;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::ObjectStoreConfig;
use crate::error::PipelineError;
use crate::loaders::Loader;
use crate::models::{Mode, RawReading};

// ---

pub struct ObjectStoreLoader {
    client: aws_sdk_s3::Client,
    ble_bucket: String,
    lte_bucket: String,
}

impl ObjectStoreLoader {
    /// Build the S3 client from the standard SDK environment chain
    /// (credentials, region).
    pub async fn connect(cfg: &ObjectStoreConfig) -> Self {
        // ---
        let aws_cfg = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_cfg),
            ble_bucket: cfg.bucket_ble.clone(),
            lte_bucket: cfg.bucket_lte.clone(),
        }
    }

    fn bucket(&self, mode: Mode) -> &str {
        match mode {
            Mode::Ble => &self.ble_bucket,
            Mode::Lte => &self.lte_bucket,
        }
    }

    /// Parquet object keys under one date partition.
    async fn parquet_keys(&self, date: &str, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        let response = self
            .client
            .list_objects_v2()
            .bucket(self.bucket(mode))
            .prefix(date)
            .send()
            .await
            .map_err(|e| PipelineError::BackendUnavailable(e.to_string()))?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key())
            .filter(|key| !key.trim().is_empty() && key.to_ascii_lowercase().ends_with(".parquet"))
            .map(str::to_owned)
            .collect())
    }
}

/// Split an object key's file name into its (sensor, phone) components.
fn key_parts(key: &str) -> Option<(&str, &str)> {
    // ---
    let name = key.rsplit('/').next()?;
    let mut parts = name.split('_');
    let sensor = parts.next()?;
    let phone = parts.next()?;
    Some((sensor, phone))
}

#[async_trait]
impl Loader for ObjectStoreLoader {
    fn source_name(&self) -> &'static str {
        "ObjectStore"
    }

    async fn list_dates(&self, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        let response = self
            .client
            .list_objects_v2()
            .bucket(self.bucket(mode))
            .delimiter("/")
            .send()
            .await
            .map_err(|e| PipelineError::BackendUnavailable(e.to_string()))?;

        let mut dates: Vec<String> = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .map(|p| p.trim_end_matches('/').to_owned())
            .collect();
        dates.sort();
        Ok(dates)
    }

    async fn list_phones(&self, date: &str, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        let keys = self.parquet_keys(date, mode).await?;
        let phones: BTreeSet<String> = keys
            .iter()
            .filter_map(|k| key_parts(k))
            .map(|(_, phone)| phone.to_owned())
            .collect();
        Ok(phones.into_iter().collect())
    }

    async fn list_sensors(
        &self,
        date: &str,
        phone: &str,
        mode: Mode,
    ) -> Result<Vec<String>, PipelineError> {
        // ---
        let keys = self.parquet_keys(date, mode).await?;
        Ok(keys
            .iter()
            .filter(|k| k.contains(phone))
            .filter_map(|k| key_parts(k))
            .map(|(sensor, _)| sensor.to_owned())
            .collect())
    }

    async fn load_recording(
        &self,
        date: &str,
        phone: &str,
        sensor: &str,
        mode: Mode,
    ) -> Result<Vec<RawReading>, PipelineError> {
        // ---
        let key = format!("{date}/{sensor}_{phone}_{date}.parquet");

        let response = self
            .client
            .get_object()
            .bucket(self.bucket(mode))
            .key(&key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    PipelineError::NotFound(key.clone())
                } else {
                    PipelineError::BackendUnavailable(service_err.to_string())
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::BackendUnavailable(e.to_string()))?
            .into_bytes();

        let rows = decode_parquet(body)?;
        tracing::debug!("decoded {} raw rows from {}", rows.len(), key);
        Ok(rows)
    }
}

// ---

/// Decode a whole Parquet object into raw rows.
///
/// Only `time` is a hard requirement; any other absent column becomes `None`
/// on every row, matching what the document backend produces for missing
/// fields.
fn decode_parquet(bytes: Bytes) -> Result<Vec<RawReading>, PipelineError> {
    // ---
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| PipelineError::SchemaMismatch(format!("unreadable parquet object: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| PipelineError::SchemaMismatch(format!("unreadable parquet object: {e}")))?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| PipelineError::SchemaMismatch(format!("parquet decode: {e}")))?;
        append_batch(&mut rows, &batch)?;
    }
    Ok(rows)
}

fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Float64Array> {
    batch.column_by_name(name)?.as_any().downcast_ref()
}

fn i64_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Int64Array> {
    batch.column_by_name(name)?.as_any().downcast_ref()
}

fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
    batch.column_by_name(name)?.as_any().downcast_ref()
}

fn value_f64(col: Option<&Float64Array>, row: usize) -> Option<f64> {
    let col = col?;
    col.is_valid(row).then(|| col.value(row))
}

fn value_i64(col: Option<&Int64Array>, row: usize) -> Option<i64> {
    let col = col?;
    col.is_valid(row).then(|| col.value(row))
}

fn value_str(col: Option<&StringArray>, row: usize) -> Option<String> {
    let col = col?;
    col.is_valid(row).then(|| col.value(row).to_owned())
}

fn append_batch(rows: &mut Vec<RawReading>, batch: &RecordBatch) -> Result<(), PipelineError> {
    // ---
    let time = batch
        .column_by_name("time")
        .ok_or_else(|| PipelineError::SchemaMismatch("required column `time` is absent".into()))?
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| PipelineError::SchemaMismatch("column `time` is not int64".into()))?;

    let sensor_id = str_column(batch, "sensor_id");
    let accel_x = f64_column(batch, "ACCEL_X");
    let accel_y = f64_column(batch, "ACCEL_Y");
    let accel_z = f64_column(batch, "ACCEL_Z");
    let gyro_x = f64_column(batch, "GYRO_X");
    let gyro_y = f64_column(batch, "GYRO_Y");
    let gyro_z = f64_column(batch, "GYRO_Z");
    let pitch = f64_column(batch, "PITCH");
    let roll = f64_column(batch, "ROLL");
    let lat = f64_column(batch, "LAT");
    let lon = f64_column(batch, "LON");
    let velocity = f64_column(batch, "VELOCITY");
    let altitude = f64_column(batch, "ALTITUDE");
    let bearing = f64_column(batch, "BEARING");
    let trip_elapsed = i64_column(batch, "TIME");
    let trip_distance = f64_column(batch, "DISTANCE");

    for row in 0..batch.num_rows() {
        // A row without a capture instant is unusable.
        if time.is_null(row) {
            continue;
        }
        rows.push(RawReading {
            time: time.value(row),
            sensor_id: value_str(sensor_id, row),
            accel_x: value_f64(accel_x, row),
            accel_y: value_f64(accel_y, row),
            accel_z: value_f64(accel_z, row),
            gyro_x: value_f64(gyro_x, row),
            gyro_y: value_f64(gyro_y, row),
            gyro_z: value_f64(gyro_z, row),
            pitch: value_f64(pitch, row),
            roll: value_f64(roll, row),
            lat: value_f64(lat, row),
            lon: value_f64(lon, row),
            velocity: value_f64(velocity, row),
            altitude: value_f64(altitude, row),
            bearing: value_f64(bearing, row),
            trip_elapsed_ms: value_i64(trip_elapsed, row),
            trip_distance_m: value_f64(trip_distance, row),
        });
    }
    Ok(())
}
