#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `ledgerwire-envelope`: JSON-RPC Envelopes and Correlation IDs
//!
//! This crate owns the wire envelope shared by every remote method:
//!
//! - [`CorrelationId`] and [`IdStrategy`] generate the client-side token a
//!   node echoes back so a response can be matched with its request.
//! - [`encode`] wraps a method name, optional parameters and an optional id
//!   into a request envelope.
//! - [`decode`] performs a *generic* shape parse of a response envelope. It
//!   locates the method name, the id, and either the `result` or the `error`
//!   region, but knows nothing about any method's payload schema.
//!
//! Payload regions are kept as raw JSON text ([`RawValue`]) so that the typed
//! decoders above this layer see the exact digits the node sent.
//!
//! ## Example
//! ```
//! use envelope::{decode, encode, CorrelationId, Body};
//!
//! let id = CorrelationId::from("req-1");
//! let request = encode("queryNetwork/tip", None::<&()>, Some(&id))?;
//! assert!(request.contains("\"queryNetwork/tip\""));
//!
//! let response = decode(
//!     r#"{"jsonrpc":"2.0","method":"queryNetwork/tip","result":"origin","id":"req-1"}"#,
//! )?;
//! assert_eq!(response.method, "queryNetwork/tip");
//! assert_eq!(response.id, Some(id));
//! assert!(matches!(response.body, Body::Result(_)));
//! # Ok::<(), envelope::EnvelopeError>(())
//! ```

pub mod codec;
pub mod id;

pub use codec::{decode, decode_request, encode, Body, Envelope, ErrorPayload, RequestEnvelope};
pub use id::{CorrelationId, IdStrategy};
pub use serde_json::value::RawValue;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Errors raised while encoding or decoding envelopes.
#[derive(thiserror::Error, Debug)]
pub enum EnvelopeError {
    /// The text does not have the shape of a JSON-RPC envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// Request parameters must serialize to a JSON object.
    #[error("Request parameters must be a JSON object, got: {0}")]
    ParamsNotObject(String),

    /// Request parameters could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Type alias for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
