//! Error types for the Outbound client.
//!
//! # Design
//! Every failure a call can hit maps to one variant, so callers branch on
//! the kind instead of parsing messages. `Data` errors are always raised
//! before any request leaves the process. `Connection` and `Api` errors
//! come back from the round-trip and are never retried here.

use thiserror::Error;

/// Errors returned by `OutboundClient` and the `Outbound` facade.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// An operation ran before an api key was configured.
    #[error("init() must be called before anything else.")]
    Configuration,

    /// A caller-supplied argument failed local validation.
    #[error("{0}")]
    Data(String),

    /// The request never produced a response (DNS, refused, timeout, TLS).
    #[error("Unknown connection error: {code} - {message}")]
    Connection { code: String, message: String },

    /// The server answered with an `{"error": {"Message", "Code"}}` body.
    #[error("{message}")]
    Api { message: String, code: i64 },

    /// The server answered with a non-empty body that is not a recognizable
    /// error object.
    #[error("unexpected response body: {body}")]
    Protocol { body: String },

    /// Programmer error, e.g. an unknown call code.
    #[error("{0}")]
    Internal(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl OutboundError {
    pub(crate) fn data(msg: impl Into<String>) -> Self {
        OutboundError::Data(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_init() {
        assert_eq!(
            OutboundError::Configuration.to_string(),
            "init() must be called before anything else."
        );
    }

    #[test]
    fn connection_error_shows_code_and_message() {
        let err = OutboundError::Connection {
            code: "timeout".to_string(),
            message: "timed out after 5s".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown connection error: timeout - timed out after 5s");
    }

    #[test]
    fn api_error_displays_server_message() {
        let err = OutboundError::Api {
            message: "bad key".to_string(),
            code: 401,
        };
        assert_eq!(err.to_string(), "bad key");
    }
}
