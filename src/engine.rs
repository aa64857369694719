//! Pipeline engine.
//!
//! Owns the ordered stage list and applies it to one record at a time,
//! isolating failures per record. Stages are appended during a build phase
//! and frozen once the first record is processed; adding a stage after that
//! is a configuration error and never disturbs an in-flight run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::config::{Format, PipelineConfig};
use crate::error::{PipelineError, StageError};
use crate::outcome::{Failure, FailureKind, Outcome};
use crate::record::Record;
use crate::stage::Stage;

/// An ordered chain of stages applied to each record independently.
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
    sealed: AtomicBool,
}

impl Pipeline {
    /// Create an empty pipeline for the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
            sealed: AtomicBool::new(false),
        }
    }

    /// Create a pipeline with an initial stage list.
    pub fn with_stages(config: PipelineConfig, stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            config,
            stages,
            sealed: AtomicBool::new(false),
        }
    }

    /// The format threaded into every stage invocation.
    pub fn format(&self) -> Format {
        self.config.format
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append a stage. Registration order is execution order.
    ///
    /// Fails with [`PipelineError::PipelineSealed`] once processing has
    /// started; the in-flight run is unaffected either way.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) -> Result<(), PipelineError> {
        if self.sealed.load(Ordering::Acquire) {
            return Err(PipelineError::PipelineSealed {
                stage: stage.name().to_string(),
            });
        }
        self.stages.push(stage);
        Ok(())
    }

    /// Push one record through every stage in registration order.
    ///
    /// The first failing stage stops processing of that record; the outcome
    /// carries the original record, the failing stage's index and name, and
    /// the failure kind the stage declared. A stage that panics is caught
    /// here and reported as a stage failure with reason `unexpected: ...`.
    pub fn process(&self, record: Record) -> Outcome {
        self.sealed.store(true, Ordering::Release);

        let original = record.clone();
        let mut current = record;

        for (index, stage) in self.stages.iter().enumerate() {
            let input = current;
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| stage.apply(input, self.config.format)));

            match result {
                Ok(Ok(next)) => current = next,
                Ok(Err(err)) => {
                    return Outcome::Failed(classify(err, original, index, stage.name()));
                }
                Err(payload) => {
                    return Outcome::Failed(Failure {
                        kind: FailureKind::Stage,
                        record: original,
                        stage: index,
                        stage_name: stage.name().to_string(),
                        reason: format!("unexpected: {}", panic_reason(payload)),
                    });
                }
            }
        }

        trace!(seq = current.seq(), stages = self.stages.len(), "record transformed");
        Outcome::Success(current)
    }
}

/// Map a declared stage error onto the outcome taxonomy.
fn classify(err: StageError, record: Record, stage: usize, stage_name: &str) -> Failure {
    let (kind, reason) = match err {
        StageError::Parse { reason } => (FailureKind::Parse, reason),
        StageError::Internal { reason } => (FailureKind::Stage, reason),
    };
    Failure {
        kind,
        record,
        stage,
        stage_name: stage_name.to_string(),
        reason,
    }
}

/// Extract a human-readable message from a panic payload.
fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic of unknown type".to_string()
    }
}
