//! Error types for method invocation.

use std::time::Duration;

use envelope::EnvelopeError;
use thiserror::Error;
use transport::TransportError;

/// A payload did not have the shape a decoder expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    /// Creates a decode error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self { DecodeError(reason.into()) }

    /// Why decoding failed.
    pub fn reason(&self) -> &str { &self.0 }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self { DecodeError(e.to_string()) }
}

/// Everything that can go wrong while invoking a remote method.
///
/// `E` is the method's own error type, produced only for error codes the
/// method's table knows about.
#[derive(Debug, Error)]
pub enum InvokeError<E> {
    /// The transport failed; no reply was obtained.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encoding(#[source] EnvelopeError),

    /// The reply is not a well-formed envelope.
    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(#[source] EnvelopeError),

    /// The reply answers a different method.
    #[error("Response for {actual:?} received while invoking {expected:?}")]
    InvalidMethod {
        /// Method that was invoked.
        expected: String,
        /// Method named by the reply.
        actual: String,
    },

    /// The reply could not be decoded into the method's result or error.
    #[error("Invalid response to {method}: {reason}")]
    InvalidResponse {
        /// Method that was invoked.
        method: String,
        /// What did not match.
        reason: String,
    },

    /// The node answered with a code the method does not declare.
    #[error("Unexpected error code {code} from {method}: {message}")]
    UnexpectedErrorCode {
        /// Method that was invoked.
        method: String,
        /// Code as received.
        code: i64,
        /// Message as received.
        message: String,
    },

    /// A declared error of the method.
    #[error("{0}")]
    Method(E),

    /// No reply arrived within the client's deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl<E> InvokeError<E> {
    /// Returns the method error, if this is one.
    pub fn method_error(&self) -> Option<&E> {
        match self {
            InvokeError::Method(e) => Some(e),
            _ => None,
        }
    }
}
