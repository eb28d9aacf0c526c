use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("fit failed while {context}: {message}")]
    Fit {
        context: &'static str,
        message: String,
    },
    #[error("scoring failed while {context}: {message}")]
    Score {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("insufficient data: {message}")]
    InsufficientData { message: String },
}

impl RecognitionError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn fit(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Fit {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn score(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Score {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    /// True when the error only marks one candidate complexity as unavailable,
    /// as opposed to a malformed request no amount of searching can fix.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(self, Self::Fit { .. } | Self::Score { .. })
    }
}
