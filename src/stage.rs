use crate::error::{PipelineError, Result};
use crate::metrics::StageMetrics;
use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, trace};

/// Trait for a processing stage in the pipeline
///
/// A stage owns the receiving end of its upstream channel and the sending
/// end of its downstream channel for the duration of `run`. Dropping the
/// sender on return is what signals end-of-stream to the next stage, so a
/// stage must only return after forwarding everything it still holds.
pub trait Stage: Send + 'static {
    /// Consume the upstream stream until it ends, emitting downstream.
    /// Blocks the calling thread until the stage terminates.
    fn run(
        self: Box<Self>,
        input: Receiver<i64>,
        output: Sender<i64>,
        metrics: StageMetrics,
    ) -> Result<()>;

    /// Get a human-readable name for this stage
    fn name(&self) -> &str {
        "stage"
    }
}

/// Keep values that are not negative.
pub fn non_negative(value: i64) -> bool {
    value >= 0
}

/// Keep nonzero multiples of three.
pub fn nonzero_multiple_of_three(value: i64) -> bool {
    value != 0 && value % 3 == 0
}

/// A stream-through stage that forwards values matching a predicate.
///
/// Holds no values of its own: one value in means at most one value out,
/// immediately. Order is preserved.
pub struct FilterStage<F>
where
    F: Fn(i64) -> bool + Send + 'static,
{
    name: String,
    predicate: F,
}

impl<F> FilterStage<F>
where
    F: Fn(i64) -> bool + Send + 'static,
{
    /// Create a new filter stage
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> Stage for FilterStage<F>
where
    F: Fn(i64) -> bool + Send + 'static,
{
    fn run(
        self: Box<Self>,
        input: Receiver<i64>,
        output: Sender<i64>,
        metrics: StageMetrics,
    ) -> Result<()> {
        debug!(stage = %self.name, "filter stage started");
        for value in input.iter() {
            if (self.predicate)(value) {
                trace!(stage = %self.name, value, "value passed filter");
                output
                    .send(value)
                    .map_err(|_| PipelineError::ChannelClosed(self.name.clone()))?;
                metrics.record_forwarded();
            } else {
                trace!(stage = %self.name, value, "value rejected by filter");
                metrics.record_dropped();
            }
        }
        debug!(stage = %self.name, "upstream ended, filter stage finished");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_non_negative_predicate() {
        for v in [0, 1, 3, 100] {
            assert!(non_negative(v), "{} should pass", v);
        }
        for v in [-1, -3, -100] {
            assert!(!non_negative(v), "{} should be rejected", v);
        }
    }

    #[test]
    fn test_nonzero_multiple_of_three_predicate() {
        for v in [3, 6, 9, 18, -3, -9] {
            assert!(nonzero_multiple_of_three(v), "{} should pass", v);
        }
        for v in [0, 1, 2, 4, 5, 7, -1, -4] {
            assert!(!nonzero_multiple_of_three(v), "{} should be rejected", v);
        }
    }

    #[test]
    fn test_predicate_composition() {
        // the pipeline keeps a value only if it survives both filters
        let survives = |v: i64| non_negative(v) && nonzero_multiple_of_three(v);
        let input = [-9, -2, -1, 0, 1, 2, 3, 4, 9, 18];
        let kept: Vec<i64> = input.iter().copied().filter(|&v| survives(v)).collect();
        assert_eq!(kept, vec![3, 9, 18]);
    }

    #[test]
    fn test_filter_stage_forwards_in_order() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for v in [1, -2, 9, 4, 18] {
            in_tx.send(v).unwrap();
        }
        drop(in_tx);

        let stage = Box::new(FilterStage::new("non_negative", non_negative));
        stage.run(in_rx, out_tx, StageMetrics::new()).unwrap();

        let passed: Vec<i64> = out_rx.iter().collect();
        assert_eq!(passed, vec![1, 9, 4, 18]);
    }

    #[test]
    fn test_filter_stage_counts() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for v in -5..=5 {
            in_tx.send(v).unwrap();
        }
        drop(in_tx);

        let metrics = StageMetrics::new();
        let stage = Box::new(FilterStage::new("non_negative", non_negative));
        stage.run(in_rx, out_tx, metrics.clone()).unwrap();

        assert_eq!(metrics.total_forwarded(), 6); // 0..=5
        assert_eq!(metrics.total_dropped(), 5); // -5..=-1
        drop(out_rx);
    }

    #[test]
    fn test_filter_stage_ends_output_on_upstream_end() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded::<i64>();
        drop(in_tx); // upstream ends with no values

        let stage = Box::new(FilterStage::new("empty", |_| true));
        stage.run(in_rx, out_tx, StageMetrics::new()).unwrap();

        // sender dropped on return, so the stream reads as ended
        assert!(out_rx.iter().next().is_none());
    }
}
