//! ledgerwire umbrella crate.
//!
//! Re-exports the workspace members so that applications can depend on a
//! single crate. All functional code lives in the member crates under
//! `primitives`, `backends` and `client`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![doc(test(attr(warn(unused))))]

pub use client::{methods, types, Client, InvokeError};
pub use config::Config;
pub use envelope::{CorrelationId, IdStrategy};
pub use ledgerwire_http::HttpTransport;
pub use ledgerwire_websocket::{ConnectionState, WebSocketTransport};
pub use logging::{Observer, TracingObserver};
pub use transport::{DynTransport, Transport, TransportError};

/// Member crates, for everything not re-exported at the top level.
pub mod crates {
    pub use ledgerwire_http as http;
    pub use ledgerwire_websocket as websocket;
    pub use {client, config, envelope, logging, transport};
}

/// Miscellaneous metadata about the ledgerwire workspace.
pub mod ledgerwire_meta {
    /// Version string for the umbrella crate, as reported by Cargo.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
