use std::fmt;
use thiserror::Error;

/// Message shown for every failed background-removal round trip.
pub const REMOVAL_FAILED_MESSAGE: &str =
    "Failed to communicate with the AI model. Please check your connection and API key.";

/// Message shown for every failed text-to-image round trip.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate an image with the AI model. Please check your connection and API key.";

/// The two remote operations the studio performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RemoveBackground,
    GenerateImage,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::RemoveBackground => "remove_background",
            Operation::GenerateImage => "generate_image",
        }
    }

    /// User-safe message for a failed call of this operation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::RemoveBackground => REMOVAL_FAILED_MESSAGE,
            Operation::GenerateImage => GENERATION_FAILED_MESSAGE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What actually went wrong during a round trip. Logged, never shown to users.
#[derive(Debug, Error)]
pub enum ServiceFailure {
    #[error("No image data returned from API.")]
    EmptyResult,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Response decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Read(String),
    #[error("{0}")]
    Validation(String),
    #[error("{}", .operation.failure_message())]
    Service {
        operation: Operation,
        #[source]
        source: ServiceFailure,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    pub fn service(operation: Operation, source: ServiceFailure) -> Self {
        StudioError::Service { operation, source }
    }

    /// True when the remote call succeeded but carried no image.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            StudioError::Service {
                source: ServiceFailure::EmptyResult,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_hides_underlying_detail() {
        let err = StudioError::service(
            Operation::RemoveBackground,
            ServiceFailure::Api {
                status: 403,
                message: "API key not valid".into(),
            },
        );
        assert_eq!(err.to_string(), REMOVAL_FAILED_MESSAGE);
        assert!(!err.to_string().contains("403"));
        assert!(!err.is_empty_result());
    }

    #[test]
    fn empty_result_keeps_its_cause() {
        let err = StudioError::service(Operation::GenerateImage, ServiceFailure::EmptyResult);
        assert!(err.is_empty_result());
        assert_eq!(err.to_string(), GENERATION_FAILED_MESSAGE);

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("No image data returned from API."));
    }

    #[test]
    fn local_errors_display_their_message() {
        assert_eq!(
            StudioError::Validation("Please enter a prompt.".into()).to_string(),
            "Please enter a prompt."
        );
        assert_eq!(
            StudioError::Config("API key is required".into()).to_string(),
            "Configuration error: API key is required"
        );
    }
}
