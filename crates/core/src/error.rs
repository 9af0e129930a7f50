use std::time::Duration;

use crate::constants::LOOKUP_FALLBACK_MESSAGE;

/// Failures that end the current scan attempt.
///
/// Every variant is terminal to the attempt and is handled by returning the user to the
/// scanning view with the message attached. None of them is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("Invalid QR code format. Scanned data: \"{raw}\"")]
    PayloadInvalid { raw: String },
    #[error("{0}")]
    LookupFailed(String),
}

impl ScanError {
    /// Collapse a backend failure into the single message shown to the user.
    pub fn lookup_failed(err: &BackendError) -> Self {
        Self::LookupFailed(err.user_message())
    }
}

/// Outcome of decoding one frame that did not yield a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No code is visible in this frame. This is the steady state while scanning.
    #[error("no QR code in frame")]
    NotFound,
    #[error("decoder error: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available: {0}")]
    NotFound(String),
    #[error("camera failure: {0}")]
    Device(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl BackendError {
    /// The backend-provided message when there is one, the generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => LOOKUP_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::MalformedBody(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("backend URL is not configured (set SWASTHA_BACKEND_URL)")]
    MissingBackendUrl,
    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("invalid value for {name}: {value:?} (expected a positive integer)")]
    InvalidDuration { name: &'static str, value: String },
    #[error("AI API key is missing (set SWASTHA_AI_API_KEY)")]
    MissingAiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_preferred() {
        let err = BackendError::Status {
            status: 404,
            message: Some("Patient not found with ID: 999".into()),
        };
        assert_eq!(err.user_message(), "Patient not found with ID: 999");
        assert_eq!(
            ScanError::lookup_failed(&err),
            ScanError::LookupFailed("Patient not found with ID: 999".into())
        );
    }

    #[test]
    fn generic_fallback_without_backend_message() {
        let errors = [
            BackendError::Status {
                status: 500,
                message: None,
            },
            BackendError::Transport("connection refused".into()),
            BackendError::Timeout(Duration::from_secs(15)),
        ];
        for err in errors {
            assert_eq!(err.user_message(), LOOKUP_FALLBACK_MESSAGE);
        }
    }

    #[test]
    fn status_display_includes_message() {
        let err = BackendError::Status {
            status: 404,
            message: Some("gone".into()),
        };
        assert_eq!(err.to_string(), "backend returned 404: gone");

        let bare = BackendError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(bare.to_string(), "backend returned 502");
    }

    #[test]
    fn payload_invalid_echoes_raw_text() {
        let err = ScanError::PayloadInvalid {
            raw: "no-digits-here".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid QR code format. Scanned data: \"no-digits-here\""
        );
    }
}
