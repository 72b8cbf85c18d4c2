//! Cascading catalog endpoints: dates, then phones, then sensors.
//!
//! Each level forwards only its direct parent key to the loader. A missing or
//! empty parent selection short-circuits to an empty option list without
//! touching the backend. Responses carry display labels alongside the raw
//! selection values, matching what the dropdown UI renders.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::loaders::SharedLoader;
use crate::models::Mode;

// ---

pub fn router() -> Router<SharedLoader> {
    // ---
    Router::new()
        .route("/api/dates", get(dates))
        .route("/api/phones", get(phones))
        .route("/api/sensors", get(sensors))
}

/// One dropdown entry: `label` is what the UI shows, `value` is the full key
/// used for the next cascading level.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct CatalogQuery {
    #[serde(default)]
    mode: Mode,
    date: Option<String>,
    phone: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ---

async fn dates(
    Query(q): Query<CatalogQuery>,
    State(loader): State<SharedLoader>,
) -> Json<Vec<SelectOption>> {
    // ---
    let options = match loader.list_dates(q.mode).await {
        Ok(dates) => date_options(dates),
        Err(e) => {
            warn!("date listing failed ({}): {}", q.mode.as_str(), e);
            Vec::new()
        }
    };
    Json(options)
}

async fn phones(
    Query(q): Query<CatalogQuery>,
    State(loader): State<SharedLoader>,
) -> Json<Vec<SelectOption>> {
    // ---
    let Some(date) = non_empty(q.date) else {
        debug!("phone listing requested with no date selected; no-op");
        return Json(Vec::new());
    };

    let options = match loader.list_phones(&date, q.mode).await {
        Ok(phones) => phone_options(phones),
        Err(e) => {
            warn!("phone listing failed for date {}: {}", date, e);
            Vec::new()
        }
    };
    Json(options)
}

async fn sensors(
    Query(q): Query<CatalogQuery>,
    State(loader): State<SharedLoader>,
) -> Json<Vec<SelectOption>> {
    // ---
    let (Some(date), Some(phone)) = (non_empty(q.date), non_empty(q.phone)) else {
        debug!("sensor listing requested with incomplete selection; no-op");
        return Json(Vec::new());
    };

    let options = match loader.list_sensors(&date, &phone, q.mode).await {
        Ok(sensors) => sensor_options(sensors),
        Err(e) => {
            warn!("sensor listing failed for {}/{}: {}", date, phone, e);
            Vec::new()
        }
    };
    Json(options)
}

// ---

/// `YYYYMMDD` keys render as `YYYY-MM-DD`; anything else is shown verbatim.
fn date_options(dates: Vec<String>) -> Vec<SelectOption> {
    // ---
    dates
        .into_iter()
        .map(|date| {
            let label = if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
                format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..])
            } else {
                date.clone()
            };
            SelectOption { label, value: date }
        })
        .collect()
}

/// 11-digit phone numbers render with `XXX-XXXX-XXXX` grouping; anything else
/// verbatim.
fn phone_options(phones: Vec<String>) -> Vec<SelectOption> {
    // ---
    phones
        .into_iter()
        .map(|phone| {
            let label = if phone.len() == 11 && phone.bytes().all(|b| b.is_ascii_digit()) {
                format!("{}-{}-{}", &phone[..3], &phone[3..7], &phone[7..])
            } else {
                phone.clone()
            };
            SelectOption {
                label,
                value: phone,
            }
        })
        .collect()
}

/// Sensors render by their last four characters; the full id stays the value.
fn sensor_options(sensors: Vec<String>) -> Vec<SelectOption> {
    // ---
    sensors
        .into_iter()
        .map(|sensor| {
            let skip = sensor.chars().count().saturating_sub(4);
            let label: String = sensor.chars().skip(skip).collect();
            SelectOption {
                label,
                value: sensor,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::loaders::memory::MemoryLoader;
    use std::sync::Arc;

    #[test]
    fn date_labels_are_dashed() {
        // ---
        let options = date_options(vec!["20230101".into(), "backfill".into()]);
        assert_eq!(options[0].label, "2023-01-01");
        assert_eq!(options[0].value, "20230101");
        assert_eq!(options[1].label, "backfill");
    }

    #[test]
    fn phone_labels_group_eleven_digits() {
        // ---
        let options = phone_options(vec!["01012345678".into(), "internal-07".into()]);
        assert_eq!(options[0].label, "010-1234-5678");
        assert_eq!(options[0].value, "01012345678");
        assert_eq!(options[1].label, "internal-07");
    }

    #[test]
    fn sensor_labels_keep_last_four_chars() {
        // ---
        let options = sensor_options(vec!["SENSOR0001".into(), "S2".into()]);
        assert_eq!(options[0].label, "0001");
        assert_eq!(options[0].value, "SENSOR0001");
        assert_eq!(options[1].label, "S2");
    }

    #[tokio::test]
    async fn cascade_queries_only_direct_parent_keys() {
        // ---
        let mut mem = MemoryLoader::new();
        mem.insert(Mode::Ble, "20230101", "01012345678", "SENSOR0001", vec![]);
        let mem = Arc::new(mem);
        let loader: SharedLoader = mem.clone();

        let dates = dates(
            Query(CatalogQuery {
                mode: Mode::Ble,
                date: None,
                phone: None,
            }),
            State(loader.clone()),
        )
        .await;
        assert_eq!(dates.0[0].value, "20230101");

        let phones = phones(
            Query(CatalogQuery {
                mode: Mode::Ble,
                date: Some("20230101".into()),
                phone: None,
            }),
            State(loader.clone()),
        )
        .await;
        assert_eq!(phones.0[0].value, "01012345678");

        let sensors = sensors(
            Query(CatalogQuery {
                mode: Mode::Ble,
                date: Some("20230101".into()),
                phone: Some("01012345678".into()),
            }),
            State(loader),
        )
        .await;
        assert_eq!(sensors.0[0].value, "SENSOR0001");

        // Each level used exactly its parent keys, nothing more.
        assert_eq!(
            mem.calls(),
            vec![
                "list_dates(ble)",
                "list_phones(20230101)",
                "list_sensors(20230101,01012345678)",
            ]
        );
    }

    #[tokio::test]
    async fn missing_parent_selection_is_a_no_op() {
        // ---
        let mem = Arc::new(MemoryLoader::new());
        let loader: SharedLoader = mem.clone();

        let phones = phones(
            Query(CatalogQuery {
                mode: Mode::Ble,
                date: None,
                phone: None,
            }),
            State(loader.clone()),
        )
        .await;
        assert!(phones.0.is_empty());

        let sensors = sensors(
            Query(CatalogQuery {
                mode: Mode::Ble,
                date: Some("20230101".into()),
                phone: Some(String::new()),
            }),
            State(loader),
        )
        .await;
        assert!(sensors.0.is_empty());

        // The backend was never consulted.
        assert!(mem.calls().is_empty());
    }
}
