//! Error types and handling
//!
//! Common error types used across the crate.

use thiserror::Error;

/// Errors raised while capturing, chunking or delivering a recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecordingError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            RecordingError::AlreadyRecording => "ALREADY_RECORDING",
            RecordingError::NotRecording => "NOT_RECORDING",
            RecordingError::DeviceNotFound(_) => "DEVICE_NOT_FOUND",
            RecordingError::CaptureError(_) => "CAPTURE_ERROR",
            RecordingError::Delivery(_) => "DELIVERY_ERROR",
            RecordingError::MissingFile(_) => "MISSING_FILE",
            RecordingError::Io(_) => "IO_ERROR",
            RecordingError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type alias using RecordingError
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Errors raised while loading client configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid voice broadcast chunk length: {0}")]
    InvalidChunkLength(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RecordingError::NotRecording.code(), "NOT_RECORDING");
        assert_eq!(
            RecordingError::CaptureError("denied".to_string()).code(),
            "CAPTURE_ERROR"
        );

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(RecordingError::from(io).code(), "IO_ERROR");
    }

    #[test]
    fn test_error_messages() {
        let error = RecordingError::CaptureError("permission denied".to_string());
        assert_eq!(error.to_string(), "Capture error: permission denied");

        let error = ConfigError::InvalidChunkLength(-1.0);
        assert_eq!(error.to_string(), "Invalid voice broadcast chunk length: -1");
    }
}
