//! Shared query flow: one selection in, one cleaned recording out.
//!
//! Every chart and map request runs the same three steps: fetch the raw batch
//! from the backend, normalize it into the canonical frame, erase the
//! timezone-artifact rows. The recording is rebuilt from scratch per request;
//! nothing is cached across queries.

use crate::error::PipelineError;
use crate::loaders::Loader;
use crate::models::{Mode, Recording};
use crate::processing;

// ---

/// A complete (date, phone, sensor, mode) selection from the cascading
/// dropdowns.
#[derive(Debug, Clone)]
pub struct Selection {
    pub date: String,
    pub phone: String,
    pub sensor: String,
    pub mode: Mode,
}

/// Load, normalize, and clean the recording for one selection.
pub async fn load_cleaned(
    loader: &dyn Loader,
    sel: &Selection,
) -> Result<Recording, PipelineError> {
    // ---
    let raw = loader
        .load_recording(&sel.date, &sel.phone, &sel.sensor, sel.mode)
        .await?;
    tracing::debug!(
        "selection {}/{}/{} ({}): {} raw rows",
        sel.date,
        sel.phone,
        sel.sensor,
        sel.mode.as_str(),
        raw.len()
    );

    let recording = processing::normalize(raw, sel.mode)?;
    processing::clean(recording)
}
