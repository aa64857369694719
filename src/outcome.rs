//! Tagged result of processing one record.

use std::fmt;

use crate::record::Record;

/// Classification of a per-record failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The record is malformed for the declared format. Expected; the
    /// driver logs and continues.
    Parse,
    /// A stage failed for a reason unrelated to record content, or raised
    /// an unclassified error caught at the engine boundary.
    Stage,
}

impl FailureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::Parse => "parse",
            FailureKind::Stage => "stage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified per-record failure: which stage, why, and the original
/// (untransformed) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    /// The record as read from the source, before any stage touched it.
    pub record: Record,
    /// Index of the failing stage in registration order.
    pub stage: usize,
    /// Display name of the failing stage.
    pub stage_name: String,
    pub reason: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: {} failure in stage {} ({}): {}",
            self.record.seq(),
            self.kind,
            self.stage,
            self.stage_name,
            self.reason
        )
    }
}

/// The result of pushing one record through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage succeeded; carries the final transformed record.
    Success(Record),
    /// A stage failed; carries the classified failure.
    Failed(Failure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}
