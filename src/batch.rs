use crate::buffer::BoundedRing;
use crate::error::{PipelineError, Result};
use crate::metrics::StageMetrics;
use crate::stage::Stage;
use crossbeam::channel::{tick, Receiver, Sender};
use crossbeam::select;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A stage that decouples upstream arrival timing from downstream
/// consumption by accumulating values in a [`BoundedRing`] and releasing
/// them in bursts.
///
/// The stage services exactly one event at a time from a single wait point:
/// an incoming value is pushed onto the ring (a full ring discards it), a
/// timer tick drains the ring downstream, and upstream disconnect triggers
/// one final drain before the stage ends its own output. Only one flush is
/// ever in progress, so the ring never needs locking.
pub struct BatchStage {
    ring: BoundedRing,
    flush_interval: Duration,
}

impl BatchStage {
    /// Create a batch stage with the given ring capacity and flush period.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`crate::PipelineBuilder::build`]
    /// validates this before construction.
    pub fn new(capacity: usize, flush_interval: Duration) -> Self {
        Self {
            ring: BoundedRing::new(capacity),
            flush_interval,
        }
    }

    /// Drain the ring and emit every value downstream in insertion order.
    fn flush(&mut self, output: &Sender<i64>, metrics: &StageMetrics) -> Result<()> {
        let drained = self.ring.drain_all();
        metrics.record_flush();
        trace!(count = drained.len(), "ring drained");
        for value in drained {
            output
                .send(value)
                .map_err(|_| PipelineError::ChannelClosed(self.name().to_string()))?;
            metrics.record_forwarded();
        }
        Ok(())
    }
}

impl Stage for BatchStage {
    fn run(
        mut self: Box<Self>,
        input: Receiver<i64>,
        output: Sender<i64>,
        metrics: StageMetrics,
    ) -> Result<()> {
        debug!(
            capacity = self.ring.capacity(),
            interval_ms = self.flush_interval.as_millis() as u64,
            "batch stage started"
        );
        // Fixed-period cadence: a drain does not reset the ticker.
        let ticker = tick(self.flush_interval);
        loop {
            select! {
                recv(input) -> msg => match msg {
                    Ok(value) => {
                        if self.ring.push(value) {
                            trace!(value, held = self.ring.len(), "value buffered");
                        } else {
                            warn!(value, "ring full, value dropped");
                            metrics.record_dropped();
                        }
                    }
                    Err(_) => {
                        debug!("upstream ended, flushing ring");
                        self.flush(&output, &metrics)?;
                        debug!("batch stage finished");
                        return Ok(());
                    }
                },
                recv(ticker) -> _ => {
                    debug!("flush timer fired");
                    self.flush(&output, &metrics)?;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "batch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::thread;

    const LONG_INTERVAL: Duration = Duration::from_secs(3600);

    #[test]
    fn test_final_flush_on_upstream_end() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for v in [9, 18, 27] {
            in_tx.send(v).unwrap();
        }
        drop(in_tx);

        let stage = Box::new(BatchStage::new(10, LONG_INTERVAL));
        stage.run(in_rx, out_tx, StageMetrics::new()).unwrap();

        let emitted: Vec<i64> = out_rx.iter().collect();
        assert_eq!(emitted, vec![9, 18, 27]);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for v in [1, 2, 3, 4, 5] {
            in_tx.send(v).unwrap();
        }
        drop(in_tx);

        let metrics = StageMetrics::new();
        let stage = Box::new(BatchStage::new(2, LONG_INTERVAL));
        stage.run(in_rx, out_tx, metrics.clone()).unwrap();

        // first two fit, the last three were discarded at push time
        let emitted: Vec<i64> = out_rx.iter().collect();
        assert_eq!(emitted, vec![1, 2]);
        assert_eq!(metrics.total_dropped(), 3);
        assert_eq!(metrics.total_forwarded(), 2);
    }

    #[test]
    fn test_timer_flush_emits_accumulated_values() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();

        let stage = Box::new(BatchStage::new(10, Duration::from_millis(50)));
        let handle = thread::spawn(move || stage.run(in_rx, out_tx, StageMetrics::new()));

        for v in [3, 6, 9] {
            in_tx.send(v).unwrap();
        }
        // the next tick flushes everything accumulated so far
        for expected in [3, 6, 9] {
            let got = out_rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert_eq!(got, expected);
        }

        drop(in_tx);
        handle.join().unwrap().unwrap();
        assert!(out_rx.iter().next().is_none());
    }

    #[test]
    fn test_empty_tick_emits_nothing() {
        let (in_tx, in_rx) = unbounded::<i64>();
        let (out_tx, out_rx) = unbounded::<i64>();

        let stage = Box::new(BatchStage::new(10, Duration::from_millis(20)));
        let handle = thread::spawn(move || stage.run(in_rx, out_tx, StageMetrics::new()));

        // several ticks pass with nothing buffered
        thread::sleep(Duration::from_millis(150));
        assert!(out_rx.try_recv().is_err());

        drop(in_tx);
        handle.join().unwrap().unwrap();
        assert_eq!(out_rx.iter().count(), 0);
    }

    #[test]
    fn test_flush_accounting_across_ticks() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();

        let metrics = StageMetrics::new();
        let stage = Box::new(BatchStage::new(10, Duration::from_millis(30)));
        let handle = thread::spawn({
            let metrics = metrics.clone();
            move || stage.run(in_rx, out_tx, metrics)
        });

        for batch in [[1, 2], [3, 4]] {
            for v in batch {
                in_tx.send(v).unwrap();
            }
            thread::sleep(Duration::from_millis(90));
        }
        drop(in_tx);
        handle.join().unwrap().unwrap();

        // every value that fit at push time comes out exactly once
        let emitted: Vec<i64> = out_rx.iter().collect();
        assert_eq!(emitted, vec![1, 2, 3, 4]);
        assert_eq!(metrics.total_forwarded(), 4);
        assert_eq!(metrics.total_dropped(), 0);
    }
}
