//! Error types and result utilities for streaming and playback operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::wav::WavFormatError;

/// Convenience type alias for results that may contain a [`RemoteAudioError`].
pub type RemoteAudioResult<T> = Result<T, RemoteAudioError>;

/// Error types that can occur while opening, feeding or playing a stream.
///
/// Construction-time failures (unreadable file, bad header, HTTP status) are
/// returned to the caller in place of a stream. Failures on background
/// producer threads never surface here; they show up as a stream that goes
/// quiet and eventually times out.
#[derive(Error, Debug)]
pub enum RemoteAudioError {
    /// Local read or stat failure.
    #[error("File I/O error on {}: {source}", path.display())]
    FileIo {
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an anonymous reader (no path to report).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure.
    #[error("HTTP I/O error: {0}")]
    HttpIo(String),

    /// The server answered with something other than 200 OK.
    #[error("HTTP request failed: {status} {reason}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase, if known
        reason: String,
    },

    /// WAV header failed to parse or validate.
    #[error("WAV format error: {0}")]
    WavFormat(#[from] WavFormatError),

    /// Caller supplied inconsistent or missing construction arguments.
    #[error("Invalid input parameters: {0}")]
    InvalidInputParameters(String),

    /// No output device matched the selector.
    #[error("Device not found: {device_name}")]
    DeviceNotFound {
        /// Description of what was looked for
        device_name: String,
    },

    /// Device-related errors other than lookup failures.
    #[error("Device error: {0}")]
    Device(String),

    /// Backend-specific errors (cpal, ...).
    #[error("Backend error: {backend} - {details}")]
    Backend {
        /// Name of the backend that failed
        backend: &'static str,
        /// Backend-provided description
        details: String,
    },

    /// The external transcoder could not be started or is not installed.
    #[error("Transcoder error: {0}")]
    Transcoder(String),
}

impl RemoteAudioError {
    /// Create a file I/O error for `path`.
    pub fn file_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a device not found error
    pub fn device_not_found(device_name: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device_name: device_name.into(),
        }
    }

    /// Create a backend error
    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    /// Create an invalid input parameters error
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::InvalidInputParameters(details.into())
    }

    /// Create an error from a non-200 HTTP status code.
    pub fn http_status(status: u16, reason: Option<&str>) -> Self {
        Self::HttpStatus {
            status,
            reason: reason.unwrap_or("Unknown Status").to_string(),
        }
    }

    /// Check if this error indicates a device problem
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::Device(_) | Self::DeviceNotFound { .. } | Self::Backend { .. }
        )
    }

    /// Check if this error is related to the WAV container format
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::WavFormat(_))
    }

    /// Check if this error came from reading a file or a remote resource
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::FileIo { .. } | Self::Io(_) | Self::HttpIo(_) | Self::HttpStatus { .. }
        )
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RemoteAudioError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpIo(err.to_string())
    }
}

#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for RemoteAudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        Self::backend("cpal", format!("Failed to build stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for RemoteAudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        Self::backend("cpal", format!("Failed to play stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PauseStreamError> for RemoteAudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        Self::backend("cpal", format!("Failed to pause stream: {}", err))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::DevicesError> for RemoteAudioError {
    fn from(err: cpal::DevicesError) -> Self {
        Self::backend("cpal", format!("Failed to enumerate devices: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = RemoteAudioError::device_not_found("Buds");
        assert!(err.is_device_error());
        assert!(!err.is_io_error());

        let err = RemoteAudioError::file_io(
            "/nowhere.wav",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_io_error());
        assert!(err.to_string().contains("/nowhere.wav"));

        let err: RemoteAudioError = WavFormatError::UnsupportedSubchunk1Size(12).into();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_http_status_message() {
        let err = RemoteAudioError::http_status(404, Some("Not Found"));
        assert_eq!(err.to_string(), "HTTP request failed: 404 Not Found");

        let err = RemoteAudioError::http_status(599, None);
        assert!(err.to_string().contains("Unknown Status"));
    }
}
