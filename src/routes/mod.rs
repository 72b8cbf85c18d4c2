use axum::Router;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::loaders::SharedLoader;
use crate::models::Mode;
use crate::query::Selection;

mod catalog;
mod charts;
mod health;
mod track;

// ---

pub fn router(loader: SharedLoader) -> Router {
    // ---
    Router::new()
        .merge(catalog::router())
        .merge(charts::router())
        .merge(track::router())
        .merge(health::router())
        .with_state(loader)
}

/// Query parameters shared by the chart and map endpoints. All three keys must
/// be present and non-empty before any backend work happens.
#[derive(Debug, Deserialize)]
pub(crate) struct SelectionQuery {
    #[serde(default)]
    mode: Mode,
    date: Option<String>,
    phone: Option<String>,
    sensor: Option<String>,
}

impl SelectionQuery {
    /// `None` when the cascading selection is incomplete; callers treat that
    /// as a no-op, not an error.
    pub(crate) fn into_selection(self) -> Option<Selection> {
        // ---
        let date = self.date.filter(|v| !v.is_empty())?;
        let phone = self.phone.filter(|v| !v.is_empty())?;
        let sensor = self.sensor.filter(|v| !v.is_empty())?;
        Some(Selection {
            date,
            phone,
            sensor,
            mode: self.mode,
        })
    }
}

/// Boundary policy for the data endpoints: every pipeline failure becomes a
/// user-visible "no data" outcome. Logs keep the distinction the response
/// drops — backend faults at warn, genuine absence at info.
pub(crate) fn log_no_data(endpoint: &str, err: &PipelineError) {
    // ---
    if err.is_backend_fault() {
        tracing::warn!("{} returning empty result: {}", endpoint, err);
    } else {
        tracing::info!("{} returning empty result: {}", endpoint, err);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn incomplete_selection_is_none() {
        // ---
        let q = SelectionQuery {
            mode: Mode::Ble,
            date: Some("20230101".into()),
            phone: Some(String::new()),
            sensor: Some("SENSOR0001".into()),
        };
        assert!(q.into_selection().is_none());
    }

    #[test]
    fn complete_selection_passes_through() {
        // ---
        let q = SelectionQuery {
            mode: Mode::Lte,
            date: Some("20230101".into()),
            phone: Some("01012345678".into()),
            sensor: Some("SENSOR0001".into()),
        };
        let sel = q.into_selection().unwrap();
        assert_eq!(sel.date, "20230101");
        assert_eq!(sel.mode, Mode::Lte);
    }
}
