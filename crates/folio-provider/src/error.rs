use thiserror::Error;

/// Every way a generation attempt can fail. All variants mean the same thing
/// to callers: the backend is unavailable for this message and the fallback
/// responder should answer instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend unreachable at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("generation request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("generation transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation backend offline: {0}")]
    Offline(String),
}

impl GenerationError {
    /// Short machine-readable label, used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Transport(_) => "transport",
            Self::Offline(_) => "offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_includes_code_and_body() {
        let err = GenerationError::Status {
            status: 503,
            body: "model loading".into(),
        };
        assert_eq!(err.to_string(), "generation backend returned 503: model loading");
        assert_eq!(err.kind(), "status");
    }

    #[test]
    fn offline_kind() {
        assert_eq!(GenerationError::Offline("disabled".into()).kind(), "offline");
    }
}
