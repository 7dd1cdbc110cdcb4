//! A concurrent integer stream pipeline with filtering and time/size-bounded batching.
//!
//! Values flow Source → Filter → Filter → Batch → Sink, one thread per
//! stage, with neighboring stages connected by rendezvous channels. The
//! batch stage accumulates values in a fixed-capacity ring and releases
//! them in bursts: a periodic timer drains the ring downstream, and the
//! upstream stream ending triggers one final drain before the stage ends
//! its own output.
//!
//! # Features
//!
//! - Fixed-capacity circular buffer with drop-newest overflow behavior
//! - Single `select!` wait point merging values, timer ticks, and
//!   end-of-stream into one flush decision process
//! - Rendezvous (zero-capacity) handoff between stages; nothing is buffered
//!   outside the ring
//! - Per-stage counters: forwarded, dropped, flushes
//! - Builder pattern for pipeline construction
//! - `tracing` diagnostics, filtered at runtime
//!
//! # Example
//!
//! ```ignore
//! use stream_batcher::{stage, PipelineBuilder};
//! use crossbeam::channel::bounded;
//! use std::time::Duration;
//!
//! let (tx, rx) = bounded(0);
//! let pipeline = PipelineBuilder::new()
//!     .filter("non_negative", stage::non_negative)
//!     .filter("multiple_of_three", stage::nonzero_multiple_of_three)
//!     .batch(10, Duration::from_secs(5))
//!     .build()?;
//!
//! let running = pipeline.start(rx);
//! // Feed values through tx, drain running.output(), then:
//! running.wait()?;
//! ```

pub mod batch;
pub mod buffer;
pub mod console;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod stage;

// Re-exports for convenience
pub use batch::BatchStage;
pub use buffer::BoundedRing;
pub use error::{PipelineError, Result};
pub use metrics::{MetricsSnapshot, StageMetrics};
pub use pipeline::{Pipeline, PipelineBuilder, RunningPipeline};
pub use stage::{non_negative, nonzero_multiple_of_three, FilterStage, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
