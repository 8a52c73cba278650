//! Error types for ayu-api

use thiserror::Error;

/// Result type alias using ayu-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the intake backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connect, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned a non-success status
    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend named a field type this client does not know
    #[error("unknown field type {0:?}")]
    UnknownFieldType(String),

    /// A selection-typed field arrived without any options to select from
    #[error("field {key:?} expects a selection but no options were provided")]
    MissingOptions { key: String },

    /// A speech payload was not valid base64
    #[error("invalid audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),

    /// Response shape the client cannot make sense of
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Whether this error is a transport failure (network/timeout) rather
    /// than a problem with the response content.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Whether this error came from validating the response at the boundary.
    pub fn is_contract(&self) -> bool {
        matches!(
            self,
            Error::UnknownFieldType(_)
                | Error::MissingOptions { .. }
                | Error::InvalidAudio(_)
                | Error::UnexpectedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_errors_are_not_transport() {
        let e = Error::UnknownFieldType("slider".into());
        assert!(e.is_contract());
        assert!(!e.is_transport());

        let e = Error::MissingOptions { key: "gender".into() };
        assert!(e.is_contract());
        assert!(!e.is_transport());
    }

    #[test]
    fn test_api_error_display() {
        let e = Error::Api {
            status: 503,
            message: "service unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("503"), "got: {}", msg);
        assert!(msg.contains("service unavailable"), "got: {}", msg);
        assert!(!e.is_transport());
        assert!(!e.is_contract());
    }
}
