//! Gateway error types
//!
//! Every failure a gateway call can produce, grouped into the classes the
//! UI reacts to: transport problems, rejected input, missing resources and
//! anything else the backend reports.

use thiserror::Error;

use crate::models::InputError;

/// Errors returned by the remote data gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Could not reach the backend at all
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the request (HTTP 400/422)
    #[error("Validation error: {detail}")]
    Validation { detail: String },

    #[error("Not found: {detail}")]
    NotFound { detail: String },

    /// Unclassified backend failure
    #[error("API error {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),
}

/// Coarse error class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    NotFound,
    Server,
}

impl GatewayError {
    /// Classify a transport error by its cause
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::Unavailable(err.to_string())
        } else {
            GatewayError::Request(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Unavailable(_) | GatewayError::Timeout | GatewayError::Request(_) => {
                ErrorKind::Network
            }
            GatewayError::Validation { .. } | GatewayError::InvalidInput(_) => ErrorKind::Validation,
            GatewayError::NotFound { .. } => ErrorKind::NotFound,
            GatewayError::Server { .. } | GatewayError::Decode(_) => ErrorKind::Server,
        }
    }

    /// The backend's `detail` message for rejected input, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Validation { detail } | GatewayError::NotFound { detail }
                if !detail.is_empty() =>
            {
                Some(detail.as_str())
            }
            _ => None,
        }
    }

    /// Message to show the user
    ///
    /// Rejected input surfaces the backend's own explanation; everything
    /// else falls back to `generic`.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            GatewayError::Validation { detail } if !detail.is_empty() => detail.clone(),
            GatewayError::InvalidInput(e) => e.to_string(),
            _ => generic.to_string(),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::Validation {
            detail: "Player already exists in this league".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error: Player already exists in this league"
        );

        let err = GatewayError::Server {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: boom");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(GatewayError::Timeout.kind(), ErrorKind::Network);
        assert_eq!(
            GatewayError::NotFound { detail: String::new() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GatewayError::InvalidInput(InputError::EqualScores(3)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(GatewayError::Decode("x".into()).kind(), ErrorKind::Server);
    }

    #[test]
    fn test_user_message() {
        let generic = "Failed to create player. Please try again.";

        let err = GatewayError::Validation {
            detail: "Player already exists in this league".to_string(),
        };
        assert_eq!(err.user_message(generic), "Player already exists in this league");

        let err = GatewayError::Validation { detail: String::new() };
        assert_eq!(err.user_message(generic), generic);
        assert_eq!(err.detail(), None);

        let err = GatewayError::Server {
            status: 502,
            message: "Bad gateway".to_string(),
        };
        assert_eq!(err.user_message(generic), generic);
    }
}
