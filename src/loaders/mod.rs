//! Storage backends for recorded sensor data.
//!
//! Both production backends (document database, object store) sit behind the
//! [`Loader`] trait: three catalog listings plus the raw-recording fetch. The
//! loader instance is built once at startup and passed to the routes as shared
//! state, so tests can swap in the in-memory fake.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::models::{Mode, RawReading};

mod docdb;
mod object_store;

#[cfg(test)]
pub(crate) mod memory;

pub use docdb::DocDbLoader;
pub use object_store::ObjectStoreLoader;

// ---

pub type SharedLoader = Arc<dyn Loader>;

/// Contract every storage backend satisfies.
///
/// The three listing calls form the cascading catalog: dates for a mode,
/// phones within a date, sensors within a date+phone pair. Each level takes
/// only its direct parent key. `load_recording` returns the raw batch for one
/// (date, phone, sensor) selection; normalization happens downstream.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Human-readable backend name, used in logs and `/health`.
    fn source_name(&self) -> &'static str;

    async fn list_dates(&self, mode: Mode) -> Result<Vec<String>, PipelineError>;

    async fn list_phones(&self, date: &str, mode: Mode) -> Result<Vec<String>, PipelineError>;

    async fn list_sensors(
        &self,
        date: &str,
        phone: &str,
        mode: Mode,
    ) -> Result<Vec<String>, PipelineError>;

    async fn load_recording(
        &self,
        date: &str,
        phone: &str,
        sensor: &str,
        mode: Mode,
    ) -> Result<Vec<RawReading>, PipelineError>;
}
