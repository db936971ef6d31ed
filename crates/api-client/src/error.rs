use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Could not reach records API at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),
}

/// Error payload the server attaches to failed requests.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl ErrorBody {
    /// `message`, or the first detailed error when the message is blank.
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.errors.and_then(|errors| errors.into_iter().next()))
    }
}

impl From<ClientError> for domain::Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status {
                message: Some(message),
                ..
            } => domain::Error::Remote { message },
            other => domain::Error::Unavailable {
                detail: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_becomes_remote_error() {
        let err: domain::Error = ClientError::Status {
            status: 409,
            message: Some("Patient not found".to_string()),
        }
        .into();
        assert_eq!(
            err,
            domain::Error::Remote {
                message: "Patient not found".to_string()
            }
        );
        assert_eq!(err.user_message("fallback"), "Patient not found");
    }

    #[test]
    fn messageless_failures_fall_back() {
        let err: domain::Error = ClientError::Status {
            status: 500,
            message: None,
        }
        .into();
        assert!(matches!(err, domain::Error::Unavailable { .. }));
        assert_eq!(err.user_message("Failed to load medications"), "Failed to load medications");

        let err: domain::Error = ClientError::Timeout(30).into();
        assert_eq!(err.user_message("Failed to delete medication"), "Failed to delete medication");
    }

    #[test]
    fn error_body_prefers_message_then_details() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message": "", "errors": ["dose is required"]}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("dose is required"));

        let body: ErrorBody = serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00"}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
