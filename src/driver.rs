//! Driver loop and outcome routing.
//!
//! Pulls records one at a time from a source, pushes each through the
//! pipeline, and dispatches the outcome to caller-supplied callbacks in
//! source order. Record n+1 is not pulled until record n's outcome has been
//! fully dispatched, so memory use stays O(1) in source length and outcomes
//! are never reordered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, warn};

use crate::engine::Pipeline;
use crate::error::PipelineError;
use crate::outcome::{Failure, FailureKind, Outcome};
use crate::record::Record;

/// Consumer of per-record outcomes and the terminal run event.
///
/// `on_complete` fires exactly once when the source is exhausted;
/// `on_cancelled` fires exactly once instead when the run was stopped
/// through a [`CancelToken`]. Exactly one of the two is invoked per run.
pub trait OutcomeSink {
    /// A record passed every stage; carries the transformed record.
    fn on_success(&mut self, record: Record);

    /// A record failed in some stage; carries the classified failure.
    fn on_failure(&mut self, failure: Failure);

    /// The source signaled end-of-stream.
    fn on_complete(&mut self, _summary: &RunSummary) {}

    /// The run was cancelled before the source was exhausted.
    fn on_cancelled(&mut self, _summary: &RunSummary) {}
}

/// Cooperative cancellation flag shared between the driver and its caller.
///
/// Cancellation is checked before each new record is pulled; the in-flight
/// record always finishes dispatching.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the driver stop after the in-flight record.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Counters for one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records pulled from the source.
    pub records_in: u64,
    /// Records that passed every stage.
    pub succeeded: u64,
    /// Records rejected as malformed for the declared format.
    pub parse_failures: u64,
    /// Records that hit a broken or misbehaving stage.
    pub stage_failures: u64,
    /// Whether the run ended through cancellation rather than end-of-stream.
    pub cancelled: bool,
}

/// Run the pipeline over a record source, dispatching outcomes to `sink`.
///
/// Shorthand for [`run_with_cancel`] with a token nobody cancels.
pub fn run<I, S>(pipeline: &Pipeline, source: I, sink: &mut S) -> Result<RunSummary, PipelineError>
where
    I: IntoIterator<Item = Record>,
    S: OutcomeSink,
{
    run_with_cancel(pipeline, source, sink, &CancelToken::new())
}

/// Run the pipeline over a record source with cooperative cancellation.
///
/// Fails up front with [`PipelineError::EmptyPipeline`] if the pipeline has
/// no stages; a run that transforms nothing is a configuration mistake.
/// Per-record failures are dispatched to the sink, never returned.
pub fn run_with_cancel<I, S>(
    pipeline: &Pipeline,
    source: I,
    sink: &mut S,
    cancel: &CancelToken,
) -> Result<RunSummary, PipelineError>
where
    I: IntoIterator<Item = Record>,
    S: OutcomeSink,
{
    if pipeline.is_empty() {
        return Err(PipelineError::EmptyPipeline);
    }

    let mut summary = RunSummary::default();
    let mut source = source.into_iter();

    loop {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let Some(record) = source.next() else {
            break;
        };
        summary.records_in += 1;

        match pipeline.process(record) {
            Outcome::Success(transformed) => {
                debug!(seq = transformed.seq(), "record succeeded");
                summary.succeeded += 1;
                sink.on_success(transformed);
            }
            Outcome::Failed(failure) => {
                match failure.kind {
                    FailureKind::Parse => {
                        warn!(
                            seq = failure.record.seq(),
                            stage = failure.stage,
                            reason = %failure.reason,
                            "record failed to parse"
                        );
                        summary.parse_failures += 1;
                    }
                    FailureKind::Stage => {
                        error!(
                            seq = failure.record.seq(),
                            stage = failure.stage,
                            reason = %failure.reason,
                            "stage failed"
                        );
                        summary.stage_failures += 1;
                    }
                }
                sink.on_failure(failure);
            }
        }
    }

    if summary.cancelled {
        debug!(records_in = summary.records_in, "run cancelled");
        sink.on_cancelled(&summary);
    } else {
        debug!(
            records_in = summary.records_in,
            succeeded = summary.succeeded,
            parse_failures = summary.parse_failures,
            stage_failures = summary.stage_failures,
            "run complete"
        );
        sink.on_complete(&summary);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Format, PipelineConfig};
    use crate::error::StageError;
    use crate::source::from_strings;
    use crate::stage::{FnStage, ParseStage, Stage};

    /// Sink that records dispatch order and terminal events, and can
    /// cancel a token after a set number of outcomes.
    #[derive(Default)]
    struct TestSink {
        events: Vec<String>,
        completions: usize,
        cancellations: usize,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl TestSink {
        fn dispatched(&self) -> usize {
            self.events.len()
        }

        fn maybe_cancel(&self) {
            if let Some((after, token)) = &self.cancel_after
                && self.events.len() >= *after
            {
                token.cancel();
            }
        }
    }

    impl OutcomeSink for TestSink {
        fn on_success(&mut self, record: Record) {
            self.events.push(format!("ok:{}", record.content()));
            self.maybe_cancel();
        }

        fn on_failure(&mut self, failure: Failure) {
            self.events
                .push(format!("{}:{}", failure.kind, failure.record.content()));
            self.maybe_cancel();
        }

        fn on_complete(&mut self, _summary: &RunSummary) {
            self.completions += 1;
        }

        fn on_cancelled(&mut self, _summary: &RunSummary) {
            self.cancellations += 1;
        }
    }

    fn json_parse_pipeline() -> Pipeline {
        Pipeline::with_stages(PipelineConfig::new(Format::Json), vec![Box::new(ParseStage)])
    }

    fn upper_stage() -> Box<dyn Stage> {
        Box::new(FnStage::new("upper", |r: Record, _| {
            let up = r.content().to_uppercase();
            Ok(r.with_content(up))
        }))
    }

    #[test]
    fn test_outcomes_dispatched_in_source_order() {
        let pipeline = Pipeline::with_stages(
            PipelineConfig::new(Format::Text),
            vec![Box::new(FnStage::new("pick", |r: Record, _| {
                if r.content() == "B" {
                    Err(StageError::parse("rejected"))
                } else {
                    Ok(r)
                }
            }))],
        );
        let mut sink = TestSink::default();
        let summary = run(&pipeline, from_strings(["A", "B", "C"]), &mut sink).unwrap();

        assert_eq!(sink.events, vec!["ok:A", "parse:B", "ok:C"]);
        assert_eq!(summary.records_in, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.parse_failures, 1);
        assert_eq!(sink.completions, 1);
        assert_eq!(sink.cancellations, 0);
    }

    #[test]
    fn test_json_scenario() {
        let pipeline = json_parse_pipeline();
        let mut sink = TestSink::default();
        let summary = run(
            &pipeline,
            from_strings([r#"{"a":1}"#, "not json", r#"{"b":2}"#]),
            &mut sink,
        )
        .unwrap();

        assert_eq!(sink.events.len(), 3);
        assert_eq!(sink.events[0], r#"ok:{"a":1}"#);
        assert_eq!(sink.events[1], "parse:not json");
        assert_eq!(sink.events[2], r#"ok:{"b":2}"#);
        assert_eq!(summary.parse_failures, 1);
        assert_eq!(sink.completions, 1);
    }

    #[test]
    fn test_stage_failures_counted_separately() {
        let pipeline = Pipeline::with_stages(
            PipelineConfig::new(Format::Text),
            vec![Box::new(FnStage::new("flaky", |r: Record, _| {
                if r.content() == "boom" {
                    Err(StageError::internal("resource exhausted"))
                } else {
                    Ok(r)
                }
            }))],
        );
        let mut sink = TestSink::default();
        let summary = run(&pipeline, from_strings(["ok", "boom"]), &mut sink).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.stage_failures, 1);
        assert_eq!(summary.parse_failures, 0);
        assert_eq!(sink.events[1], "stage:boom");
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let pipeline = Pipeline::new(PipelineConfig::new(Format::Text));
        let mut sink = TestSink::default();
        let err = run(&pipeline, from_strings(["A"]), &mut sink).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPipeline));
        assert_eq!(sink.dispatched(), 0);
    }

    #[test]
    fn test_cancellation_stops_before_next_read() {
        let token = CancelToken::new();
        let mut sink = TestSink {
            cancel_after: Some((1, token.clone())),
            ..TestSink::default()
        };

        // Source that counts how many records were actually pulled.
        let pulled = std::cell::Cell::new(0u64);
        let source = from_strings(["A", "B", "C"]).inspect(|_| pulled.set(pulled.get() + 1));

        let pipeline =
            Pipeline::with_stages(PipelineConfig::new(Format::Text), vec![upper_stage()]);
        let summary = run_with_cancel(&pipeline, source, &mut sink, &token).unwrap();

        assert_eq!(sink.events, vec!["ok:A"]);
        assert_eq!(pulled.get(), 1);
        assert!(summary.cancelled);
        assert_eq!(sink.cancellations, 1);
        assert_eq!(sink.completions, 0);
    }

    #[test]
    fn test_cancelled_before_start_reads_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut sink = TestSink::default();
        let pipeline =
            Pipeline::with_stages(PipelineConfig::new(Format::Text), vec![upper_stage()]);
        let summary =
            run_with_cancel(&pipeline, from_strings(["A"]), &mut sink, &token).unwrap();

        assert_eq!(summary.records_in, 0);
        assert!(summary.cancelled);
        assert_eq!(sink.cancellations, 1);
    }

    #[test]
    fn test_driver_pulls_lazily() {
        // The driver must not read ahead of dispatch: after each dispatched
        // outcome, at most that many records have been pulled.
        let pulled = std::cell::Cell::new(0u64);
        let source = from_strings(["A", "B", "C", "D"]).inspect(|_| pulled.set(pulled.get() + 1));

        struct LazinessSink<'a> {
            pulled: &'a std::cell::Cell<u64>,
            dispatched: u64,
        }
        impl OutcomeSink for LazinessSink<'_> {
            fn on_success(&mut self, _record: Record) {
                self.dispatched += 1;
                assert_eq!(self.pulled.get(), self.dispatched);
            }
            fn on_failure(&mut self, _failure: Failure) {
                self.dispatched += 1;
            }
        }

        let pipeline =
            Pipeline::with_stages(PipelineConfig::new(Format::Text), vec![upper_stage()]);
        let mut sink = LazinessSink {
            pulled: &pulled,
            dispatched: 0,
        };
        run(&pipeline, source, &mut sink).unwrap();
        assert_eq!(sink.dispatched, 4);
    }

    #[test]
    fn test_large_synthetic_source_streams() {
        // O(1) memory in source size: generate records lazily, never collect.
        let n = 100_000u64;
        let source = (0..n).map(|i| Record::new(i, format!("line {i}")));
        let pipeline =
            Pipeline::with_stages(PipelineConfig::new(Format::Text), vec![upper_stage()]);

        struct CountingSink {
            seen: u64,
        }
        impl OutcomeSink for CountingSink {
            fn on_success(&mut self, record: Record) {
                assert_eq!(record.seq(), self.seen);
                self.seen += 1;
            }
            fn on_failure(&mut self, failure: Failure) {
                panic!("unexpected failure: {failure}");
            }
        }

        let mut sink = CountingSink { seen: 0 };
        let summary = run(&pipeline, source, &mut sink).unwrap();
        assert_eq!(summary.records_in, n);
        assert_eq!(summary.succeeded, n);
        assert_eq!(sink.seen, n);
    }
}
