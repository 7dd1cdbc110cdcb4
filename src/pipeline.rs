use crate::batch::BatchStage;
use crate::error::{PipelineError, Result};
use crate::metrics::StageMetrics;
use crate::stage::{FilterStage, Stage};
use crossbeam::channel::{bounded, Receiver};
use std::thread::{spawn, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// A stage configuration in the pipeline builder
enum StageSpec {
    Filter {
        name: String,
        predicate: Box<dyn Fn(i64) -> bool + Send + 'static>,
    },
    Batch {
        capacity: usize,
        flush_interval: Duration,
    },
}

impl StageSpec {
    fn name(&self) -> &str {
        match self {
            StageSpec::Filter { name, .. } => name,
            StageSpec::Batch { .. } => "batch",
        }
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    stages: Vec<StageSpec>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a filter stage that forwards values matching `predicate`
    pub fn filter<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(i64) -> bool + Send + 'static,
    {
        self.stages.push(StageSpec::Filter {
            name: name.into(),
            predicate: Box::new(predicate),
        });
        self
    }

    /// Append a batch stage with the given ring capacity and flush period
    pub fn batch(mut self, capacity: usize, flush_interval: Duration) -> Self {
        self.stages.push(StageSpec::Batch {
            capacity,
            flush_interval,
        });
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(PipelineError::NoStages);
        }
        for spec in &self.stages {
            if let StageSpec::Batch {
                capacity,
                flush_interval,
            } = spec
            {
                if *capacity == 0 {
                    return Err(PipelineError::ConfigError(
                        "batch capacity must be at least 1".into(),
                    ));
                }
                if flush_interval.is_zero() {
                    return Err(PipelineError::ConfigError(
                        "flush interval must be non-zero".into(),
                    ));
                }
            }
        }

        let stage_names = self.stages.iter().map(|s| s.name().to_string()).collect();
        let metrics = self.stages.iter().map(|_| StageMetrics::new()).collect();
        Ok(Pipeline {
            stages: self.stages,
            stage_names,
            metrics,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A processing pipeline that chains stages together
pub struct Pipeline {
    stages: Vec<StageSpec>,
    stage_names: Vec<String>,
    metrics: Vec<StageMetrics>,
}

impl Pipeline {
    /// Start the pipeline, consuming `input` as the upstream stream.
    ///
    /// Spawns one thread per stage; neighboring stages are connected by
    /// rendezvous channels, so a send completes only when the receiver is
    /// ready and the channels themselves hold no values.
    pub fn start(self, input: Receiver<i64>) -> RunningPipeline {
        let Pipeline {
            stages,
            stage_names,
            metrics,
        } = self;

        let mut upstream = input;
        let mut handles = Vec::new();
        for (spec, stage_metrics) in stages.into_iter().zip(metrics.iter()) {
            let stage: Box<dyn Stage> = match spec {
                StageSpec::Filter { name, predicate } => {
                    Box::new(FilterStage::new(name, predicate))
                }
                StageSpec::Batch {
                    capacity,
                    flush_interval,
                } => Box::new(BatchStage::new(capacity, flush_interval)),
            };

            debug!(stage = stage.name(), "spawning stage thread");
            let (tx, rx) = bounded(0);
            let stage_metrics = stage_metrics.clone();
            let handle = spawn(move || stage.run(upstream, tx, stage_metrics));
            upstream = rx;
            handles.push(handle);
        }

        RunningPipeline {
            output: upstream,
            handles,
            stage_names,
            metrics,
        }
    }
}

/// A running pipeline that can be drained and joined
pub struct RunningPipeline {
    output: Receiver<i64>,
    handles: Vec<JoinHandle<Result<()>>>,
    stage_names: Vec<String>,
    metrics: Vec<StageMetrics>,
}

impl RunningPipeline {
    /// Get a receiver for the final stage's output stream.
    ///
    /// The stream ends once the upstream source ends and every stage has
    /// drained what it already held.
    pub fn output(&self) -> Receiver<i64> {
        self.output.clone()
    }

    /// Get metrics for a specific stage
    pub fn stage_metrics(&self, index: usize) -> Option<&StageMetrics> {
        self.metrics.get(index)
    }

    /// Get a summary of all stage counters
    pub fn metrics_summary(&self) -> String {
        let mut summary = String::from("Pipeline Metrics Summary:\n");
        for (name, metrics) in self.stage_names.iter().zip(&self.metrics) {
            summary.push_str(&format!("  {}: {}\n", name, metrics.snapshot().format()));
        }
        summary
    }

    /// Wait for every stage thread to finish and surface the first error.
    ///
    /// The final stage blocks handing values to the output receiver, so the
    /// caller must drain [`RunningPipeline::output`] before waiting.
    pub fn wait(self) -> Result<()> {
        for handle in self.handles {
            handle
                .join()
                .map_err(|_| PipelineError::ThreadError("stage thread panicked".into()))??;
        }
        Ok(())
    }
}
