//! Document-database backend.
//!
//! Recordings live in per-mode databases where each collection is one capture
//! date and each document is one raw row. Phones and sensors are discovered
//! with `distinct` queries, so listing stays cheap even for large collections.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Database};

use crate::config::DocDbConfig;
use crate::error::PipelineError;
use crate::loaders::Loader;
use crate::models::{Mode, RawReading};

// ---

/// Matches the upstream collector's insert batch size.
const FIND_BATCH_SIZE: u32 = 10_000;

pub struct DocDbLoader {
    ble: Database,
    lte: Database,
}

impl DocDbLoader {
    /// Connect both per-mode clients. TLS and credentials are part of the
    /// connection URIs.
    pub async fn connect(cfg: &DocDbConfig) -> anyhow::Result<Self> {
        // ---
        let client_ble = Client::with_uri_str(&cfg.uri_ble).await?;
        let client_lte = Client::with_uri_str(&cfg.uri_lte).await?;

        Ok(Self {
            ble: client_ble.database(&cfg.db_ble),
            lte: client_lte.database(&cfg.db_lte),
        })
    }

    fn db(&self, mode: Mode) -> &Database {
        match mode {
            Mode::Ble => &self.ble,
            Mode::Lte => &self.lte,
        }
    }
}

fn map_db_error(err: mongodb::error::Error) -> PipelineError {
    // A deserialization failure means the stored documents do not match the
    // wire contract; everything else is a backend fault.
    match *err.kind {
        ErrorKind::BsonDeserialization(ref e) => PipelineError::SchemaMismatch(e.to_string()),
        _ => PipelineError::BackendUnavailable(err.to_string()),
    }
}

#[async_trait]
impl Loader for DocDbLoader {
    fn source_name(&self) -> &'static str {
        "DocumentDB"
    }

    async fn list_dates(&self, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        let mut dates = self
            .db(mode)
            .list_collection_names()
            .await
            .map_err(map_db_error)?;
        dates.sort();
        Ok(dates)
    }

    async fn list_phones(&self, date: &str, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        let values = self
            .db(mode)
            .collection::<Document>(date)
            .distinct("phone_num", doc! {})
            .await
            .map_err(map_db_error)?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect())
    }

    async fn list_sensors(
        &self,
        date: &str,
        phone: &str,
        mode: Mode,
    ) -> Result<Vec<String>, PipelineError> {
        // ---
        let values = self
            .db(mode)
            .collection::<Document>(date)
            .distinct("sensor_id", doc! { "phone_num": phone })
            .await
            .map_err(map_db_error)?;

        Ok(values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
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
        let cursor = self
            .db(mode)
            .collection::<RawReading>(date)
            .find(doc! { "phone_num": phone, "sensor_id": sensor })
            .batch_size(FIND_BATCH_SIZE)
            .await
            .map_err(map_db_error)?;

        let rows: Vec<RawReading> = cursor.try_collect().await.map_err(map_db_error)?;

        tracing::debug!(
            "loaded {} raw rows from {} collection {}",
            rows.len(),
            mode.as_str(),
            date
        );
        Ok(rows)
    }
}
