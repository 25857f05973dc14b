use thiserror::Error;

/// Message fragments the generation endpoint uses for transient failures.
pub const TRANSIENT_MARKERS: [&str; 2] = ["Internal error", "Overloaded"];

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid image input: {0}")]
    InvalidImage(String),
    #[error("Could not load source image from {url}: {reason}. Try capturing a photo locally instead of using a remote image")]
    SourceFetch { url: String, reason: String },
    #[error("Service error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Service { status: Option<u16>, message: String },
    #[error("Generation returned no image")]
    EmptyResult,
    #[error("Session error: {0}")]
    Session(String),
}

impl StudioError {
    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        StudioError::Service {
            status,
            message: message.into(),
        }
    }

    /// Transient server failures: 500/503 or a known overload message.
    pub fn is_retryable(&self) -> bool {
        match self {
            StudioError::Service { status, message } => {
                matches!(status, Some(500) | Some(503))
                    || TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StudioError::Service { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
