//! # recpipe
//!
//! A streaming record-transformation pipeline with per-record fault
//! isolation.
//!
//! The pipeline ingests a sequence of raw text records (typically one per
//! line), applies an ordered chain of format-aware stages to each record
//! independently, and emits either a transformed record or a classified
//! failure - it never halts on a single bad record.
//!
//! ## Overview
//!
//! - **Stages** are pure transformations `Record x Format -> Record` that
//!   may fail with a parse error (bad data) or an internal error (broken
//!   stage). The engine preserves that distinction all the way to the
//!   consumer.
//! - **The engine** applies stages in registration order and stops a
//!   record at its first failure. Panics inside a stage are caught at the
//!   engine boundary and reported as stage failures.
//! - **The driver** pulls records lazily from any iterator, dispatches
//!   outcomes in source order, and supports cooperative cancellation.
//!
//! ## Example
//!
//! ```
//! use recpipe::{FnStage, Format, Outcome, Pipeline, PipelineConfig, Record};
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::new(Format::Text));
//! pipeline
//!     .add_stage(Box::new(FnStage::new("upper", |r: Record, _| {
//!         let up = r.content().to_uppercase();
//!         Ok(r.with_content(up))
//!     })))
//!     .unwrap();
//!
//! match pipeline.process(Record::new(0, "hello")) {
//!     Outcome::Success(r) => assert_eq!(r.content(), "HELLO"),
//!     Outcome::Failed(f) => panic!("unexpected failure: {f}"),
//! }
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod record;
pub mod source;
pub mod stage;

pub use config::{Format, PipelineConfig};
pub use driver::{CancelToken, OutcomeSink, RunSummary, run, run_with_cancel};
pub use engine::Pipeline;
pub use error::{PipelineError, StageError};
pub use outcome::{Failure, FailureKind, Outcome};
pub use record::Record;
pub use source::{from_reader, from_strings};
pub use stage::{
    FnStage, LowerStage, ParseStage, RejectEmptyStage, Stage, TrimStage, UpperStage,
    stage_for_name,
};
