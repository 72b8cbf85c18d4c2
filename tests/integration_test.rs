//! HTTP smoke tests against a running `sensordash` instance.
//!
//! These tests exercise the live API and need a server plus a seeded backend,
//! so they only run when `BASE_URL` is set (e.g. `BASE_URL=http://localhost:8052`).

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    backend: String,
}

#[derive(Debug, Deserialize)]
struct SelectOption {
    label: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ChartsResponse {
    status: String,
    histogram: Vec<(usize, usize)>,
    timestamps: Vec<String>,
    velocity: Vec<Option<f64>>,
}

fn base_url() -> Option<String> {
    std::env::var("BASE_URL").ok()
}

#[tokio::test]
async fn health_reports_ok_and_backend() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live API test");
        return Ok(());
    };

    let client = Client::new();
    let health: HealthResponse = client
        .get(format!("{base}/health"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(health.status, "ok");
    assert!(!health.backend.is_empty());

    Ok(())
}

#[tokio::test]
async fn catalog_cascade_resolves_top_down() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live API test");
        return Ok(());
    };

    let client = Client::new();

    let dates: Vec<SelectOption> = client
        .get(format!("{base}/api/dates?mode=ble"))
        .send()
        .await?
        .json()
        .await?;
    assert!(!dates.is_empty(), "No dates returned from {base}");

    // Level 2 depends only on the selected date.
    let date = &dates[0].value;
    let phones: Vec<SelectOption> = client
        .get(format!("{base}/api/phones?mode=ble&date={date}"))
        .send()
        .await?
        .json()
        .await?;
    assert!(!phones.is_empty(), "No phones returned for date {date}");

    // Level 3 depends on date + phone.
    let phone = &phones[0].value;
    let sensors: Vec<SelectOption> = client
        .get(format!("{base}/api/sensors?mode=ble&date={date}&phone={phone}"))
        .send()
        .await?
        .json()
        .await?;
    assert!(!sensors.is_empty(), "No sensors returned for {date}/{phone}");

    // Labels carry display formatting, values the full keys.
    for option in dates.iter().chain(&phones).chain(&sensors) {
        assert!(!option.label.is_empty());
        assert!(!option.value.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn charts_respond_without_crashing_on_empty_selection() -> Result<()> {
    // ---
    let Some(base) = base_url() else {
        eprintln!("BASE_URL not set; skipping live API test");
        return Ok(());
    };

    let client = Client::new();

    // No selection at all: the endpoint answers with an empty no-data
    // payload instead of an error status.
    let charts: ChartsResponse = client
        .get(format!("{base}/api/charts?mode=ble"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(charts.status, "no_data");
    assert!(charts.histogram.is_empty());
    assert!(charts.timestamps.is_empty());
    assert!(charts.velocity.is_empty());

    Ok(())
}
