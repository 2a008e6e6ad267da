use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("result consumer closed")]
    Closed,

    #[error("failed to write result: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
/// Errors that abort a run. Everything recoverable ends up in a record or a
/// [`crate::QueryTermination`] instead.
pub enum PipelineError {
    #[error(transparent)]
    Sink(#[from] SinkError),
}
