/// Error handling for the generation flow.
pub type EngineResult<T> = Result<T, EngineError>;

/// Main error type for generation and normalization operations.
///
/// Only `Precondition`, `Auth`, and `Transport` ever reach the user as
/// errors; schema-shape problems are absorbed by the normalizers and a
/// malformed or empty response is converted into a fallback substitution at
/// the engine layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the flow may substitute fallback content for this failure.
    /// Precondition and configuration failures abort the request instead.
    pub fn is_substitutable(&self) -> bool {
        matches!(
            self,
            EngineError::Auth(_)
                | EngineError::Transport(_)
                | EngineError::MalformedResponse(_)
                | EngineError::EmptyResponse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_is_not_substitutable() {
        let err = EngineError::Precondition("customer data is required".to_string());
        assert!(!err.is_substitutable());
    }

    #[test]
    fn test_malformed_response_is_substitutable() {
        let err = EngineError::MalformedResponse("expected key missing".to_string());
        assert!(err.is_substitutable());
    }
}
