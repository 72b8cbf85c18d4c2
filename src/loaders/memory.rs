//! In-memory fake backend for unit tests.
//!
//! Holds the full three-level catalog in nested maps and records every call,
//! so tests can assert both the cascading results and that each level was
//! queried with exactly its parent keys.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::loaders::Loader;
use crate::models::{Mode, RawReading};

// ---

type Catalog = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<RawReading>>>>;

#[derive(Default)]
pub struct MemoryLoader {
    ble: Catalog,
    lte: Catalog,
    calls: Mutex<Vec<String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mode: Mode, date: &str, phone: &str, sensor: &str, rows: Vec<RawReading>) {
        // ---
        let catalog = match mode {
            Mode::Ble => &mut self.ble,
            Mode::Lte => &mut self.lte,
        };
        catalog
            .entry(date.to_owned())
            .or_default()
            .entry(phone.to_owned())
            .or_default()
            .insert(sensor.to_owned(), rows);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn catalog(&self, mode: Mode) -> &Catalog {
        match mode {
            Mode::Ble => &self.ble,
            Mode::Lte => &self.lte,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    fn source_name(&self) -> &'static str {
        "Memory"
    }

    async fn list_dates(&self, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        self.record(format!("list_dates({})", mode.as_str()));
        Ok(self.catalog(mode).keys().cloned().collect())
    }

    async fn list_phones(&self, date: &str, mode: Mode) -> Result<Vec<String>, PipelineError> {
        // ---
        self.record(format!("list_phones({date})"));
        Ok(self
            .catalog(mode)
            .get(date)
            .map(|phones| phones.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_sensors(
        &self,
        date: &str,
        phone: &str,
        mode: Mode,
    ) -> Result<Vec<String>, PipelineError> {
        // ---
        self.record(format!("list_sensors({date},{phone})"));
        Ok(self
            .catalog(mode)
            .get(date)
            .and_then(|phones| phones.get(phone))
            .map(|sensors| sensors.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn load_recording(
        &self,
        date: &str,
        phone: &str,
        sensor: &str,
        mode: Mode,
    ) -> Result<Vec<RawReading>, PipelineError> {
        // ---
        self.record(format!("load_recording({date},{phone},{sensor})"));
        self.catalog(mode)
            .get(date)
            .and_then(|phones| phones.get(phone))
            .and_then(|sensors| sensors.get(sensor))
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("{date}/{sensor}_{phone}_{date}")))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn unknown_selection_is_not_found() {
        // ---
        let loader = MemoryLoader::new();
        let result = loader
            .load_recording("20230101", "01012345678", "SENSOR0001", Mode::Ble)
            .await;
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }

    #[tokio::test]
    async fn modes_are_separate_namespaces() {
        // ---
        let mut loader = MemoryLoader::new();
        loader.insert(Mode::Ble, "20230101", "01012345678", "SENSOR0001", vec![]);

        assert_eq!(loader.list_dates(Mode::Ble).await.unwrap(), vec!["20230101"]);
        assert!(loader.list_dates(Mode::Lte).await.unwrap().is_empty());
    }
}
