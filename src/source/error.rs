use thiserror::Error;

#[derive(Debug, Error)]
/// Errors from candidate sources.
pub enum SourceError {
    #[error("source request failed: {0}")]
    Transport(String),

    #[error("source unavailable after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source data in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transport(_))
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
