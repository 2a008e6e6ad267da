use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("malformed oracle response: {reason}")]
    Malformed { reason: String },
}

impl OracleError {
    /// True for errors caused by the response content rather than the call.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            OracleError::Malformed { .. } | OracleError::EmptyResponse
        )
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
