use thiserror::Error;

/// Result type for stream batcher operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or running a pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No stages in pipeline
    #[error("Cannot start pipeline with no stages")]
    NoStages,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A stage's downstream receiver hung up before the stage finished
    #[error("Downstream channel closed while stage '{0}' was still emitting")]
    ChannelClosed(String),

    /// Thread join error
    #[error("Thread join error: {0}")]
    ThreadError(String),

    /// I/O error at the source or sink boundary
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
