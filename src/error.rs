//! Error taxonomy for the query pipeline.
//!
//! Route handlers convert all of these into a user-visible "no data" outcome;
//! the variants exist so logs and tests can tell a storage failure apart from
//! a genuinely empty recording.

use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw batch does not match the expected column/field layout.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Recording is empty after loading or cleaning; derived metrics are
    /// undefined on zero rows.
    #[error("no rows available for the selected recording")]
    NoData,

    /// The requested partition/object does not exist in the backend.
    #[error("recording not found: {0}")]
    NotFound(String),

    /// The backend connection or query itself failed.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The cleaner's fixed-point loop exceeded its iteration bound.
    #[error("data quality failure: {0}")]
    DataQuality(String),
}

impl PipelineError {
    /// True for outcomes the UI reports identically as "no data available".
    /// Currently that is every variant; the split matters only for logging.
    pub fn is_backend_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::BackendUnavailable(_) | PipelineError::DataQuality(_)
        )
    }
}
