#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `ledgerwire-transport`: Foundational Communication Layer
//!
//! This crate defines the **core transport abstraction** used by every
//! ledgerwire client.
//!
//! A transport moves one encoded request envelope to the node and hands back
//! the one raw reply that answers it. It never interprets the reply: protocol
//! errors, method echo checks and payload decoding all happen above this
//! layer.
//!
//! ## Core Concepts
//!
//! ### `Transport` Trait
//! Defines `round_trip`, the single request/response exchange. Backends such
//! as `ledgerwire-http` (one POST per call) and `ledgerwire-websocket` (one
//! frame pair over a persistent connection) implement it.
//!
//! ### `TransportError`
//! Enumerates the connection-level failures a round trip can hit. Every
//! variant is fatal to the invocation in progress; retrying is left to the
//! caller.
//!
//! ### `DynTransport`
//! A type-erased (`Arc<dyn Transport>`) handle so that clients can work over
//! any backend without knowing which one is in use.
//!
//! ## Example
//! ```no_run
//! use transport::{DynTransport, TransportError};
//!
//! async fn demo(transport: DynTransport) -> Result<(), TransportError> {
//!     let reply = transport
//!         .round_trip(r#"{"jsonrpc":"2.0","method":"queryNetwork/tip"}"#.to_string())
//!         .await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

/// Type alias for structured error handling in transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Largest frame or message a duplex transport accepts (4 MiB).
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Canonical error type for all transport implementations.
///
/// Variants describe *why* the exchange failed without leaking backend
/// types, so higher layers can reason uniformly about HTTP and WebSocket
/// failures.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The endpoint could not be reached.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// The peer went away while the connection was in use.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// The connection has been closed; no further I/O is attempted.
    #[error("Connection closed")]
    Closed,

    /// The peer rejected the data sent, or sent data that cannot be accepted.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The HTTP endpoint answered with a status outside 200..=299.
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// Status code returned.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// An incoming frame is not valid UTF-8 text.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// An incoming frame exceeds [`MAX_FRAME_SIZE`].
    #[error("Frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Observed size, when known.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// Any other transport fault.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A request/response exchange with a node.
///
/// Implementations send the given envelope text and return the text of the
/// reply, or a [`TransportError`]. Partial or corrupted payloads are never
/// returned.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request envelope and returns the raw reply.
    async fn round_trip(&self, request: String) -> Result<String>;

    /// Returns the configured endpoint (usually a URL).
    fn endpoint(&self) -> &str;
}

/// Type alias for a shared, dynamically dispatched transport instance.
///
/// ```
/// use transport::DynTransport;
///
/// fn describe(t: &DynTransport) -> String { format!("talking to {}", t.endpoint()) }
/// ```
pub type DynTransport = Arc<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, request: String) -> Result<String> {
        (**self).round_trip(request).await
    }

    fn endpoint(&self) -> &str { (**self).endpoint() }
}
