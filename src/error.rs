//! Error taxonomy.
//!
//! Two families, kept deliberately separate:
//!
//! - [`StageError`] is what a stage returns for one record. `Parse` means
//!   the record does not conform to the declared format (expected, the
//!   driver logs and moves on); `Internal` means the stage itself broke
//!   (surfaced at higher severity so operators can tell bad data from a
//!   broken stage).
//! - [`PipelineError`] is a setup/usage error surfaced synchronously to the
//!   caller, never produced during record processing.

use thiserror::Error;

/// Failure signaled by a stage for a single record.
#[derive(Debug, Error)]
pub enum StageError {
    /// The record is malformed for the declared format.
    #[error("parse failure: {reason}")]
    Parse { reason: String },

    /// The stage failed for a reason unrelated to record content.
    #[error("stage failure: {reason}")]
    Internal { reason: String },
}

impl StageError {
    /// Convenience constructor for a parse failure.
    pub fn parse(reason: impl Into<String>) -> Self {
        StageError::Parse {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for an internal stage failure.
    pub fn internal(reason: impl Into<String>) -> Self {
        StageError::Internal {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StageError {
    fn from(err: serde_json::Error) -> Self {
        StageError::Parse {
            reason: err.to_string(),
        }
    }
}

impl From<csv::Error> for StageError {
    fn from(err: csv::Error) -> Self {
        StageError::Parse {
            reason: err.to_string(),
        }
    }
}

/// Pipeline misuse, reported to the setup caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage was added after the pipeline began processing.
    #[error("cannot add stage '{stage}': pipeline is sealed after processing starts")]
    PipelineSealed { stage: String },

    /// The stage catalog has no stage with this name.
    #[error("unknown stage '{name}'")]
    UnknownStage { name: String },

    /// No format with this name is recognized.
    #[error("unknown format '{name}' (expected json, csv, or text)")]
    UnknownFormat { name: String },

    /// The driver was handed a pipeline with no stages.
    #[error("pipeline has no stages")]
    EmptyPipeline,
}
