#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `ledgerwire-client`: Typed Method Invocation
//!
//! This crate turns a [`transport::Transport`] into typed, per-method calls.
//!
//! ## Overview
//!
//! - [`MethodDef`] describes a remote method as data: its wire name, how to
//!   decode its result and a static table of the error codes it declares.
//! - [`Invoker`] runs the one control flow shared by every method: encode,
//!   round trip, decode the envelope, check that the reply answers the
//!   request, then decode the result or resolve the error code.
//! - [`discriminated`] resolves payloads that can take several shapes.
//! - [`methods`] holds the catalogue of methods, and [`Client`] exposes each
//!   of them as an async method.
//!
//! ## Example
//! ```no_run
//! use client::{Client, InvokeError};
//! use client::methods::chain_sync::ChainSyncError;
//! use client::types::PointOrOrigin;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = config::Config::default();
//! let client = Client::from_config(&config).await?;
//!
//! match client.find_intersection(vec![PointOrOrigin::Origin]).await {
//!     Ok(found) => println!("intersection at {:?}", found.intersection),
//!     Err(InvokeError::Method(ChainSyncError::IntersectionNotFound { tip, .. })) => {
//!         println!("no intersection, node is at {:?}", tip)
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use config::{Config, ConnectionConfig, TransportKind};
use envelope::IdStrategy;
use ledgerwire_http::HttpTransport;
use ledgerwire_websocket::WebSocketTransport;
use logging::Observer;
use serde::Serialize;
use transport::{DynTransport, TransportError};

pub mod discriminated;
mod error;
pub mod invoker;
pub mod methods;
pub mod types;

pub use error::{DecodeError, InvokeError};
pub use invoker::{ErrorEntry, ErrorTable, Invoker, MethodDef};

/// Entry point for invoking methods on a node.
///
/// A `Client` is cheap to clone; clones share the transport.
#[derive(Debug, Clone)]
pub struct Client {
    invoker: Invoker,
    ids: Option<IdStrategy>,
    timeout: Option<Duration>,
}

impl Client {
    /// Client over `transport`, minting [`IdStrategy::NanoId`] ids and
    /// without a deadline.
    pub fn new(transport: DynTransport) -> Self {
        Self { invoker: Invoker::new(transport), ids: Some(IdStrategy::NanoId), timeout: None }
    }

    /// Opens the transport described by `config`.
    ///
    /// # Errors
    /// Fails if a WebSocket endpoint cannot be reached or the HTTP client
    /// cannot be initialized. HTTP transports connect lazily.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, TransportError> {
        let transport: DynTransport = match config.transport {
            TransportKind::Http => match &config.auth {
                Some(auth) => Arc::new(HttpTransport::with_auth(
                    &config.endpoint,
                    &auth.username,
                    &auth.password,
                )?),
                None => Arc::new(HttpTransport::new(&config.endpoint)?),
            },
            TransportKind::WebSocket => {
                if config.auth.is_some() {
                    tracing::warn!(endpoint = %config.endpoint, "basic auth is ignored for WebSocket endpoints");
                }
                Arc::new(WebSocketTransport::connect(config.endpoint.as_str()).await?)
            }
        };

        let client = Self::new(transport);
        Ok(match config.timeout_ms {
            Some(ms) => client.with_timeout(Duration::from_millis(ms)),
            None => client,
        })
    }

    /// Opens the transport and applies client settings from `config`.
    pub async fn from_config(config: &Config) -> Result<Self, TransportError> {
        let client = Self::connect(&config.connection).await?;
        Ok(client.with_id_strategy(config.client.id_strategy.strategy()))
    }

    /// Sets how correlation ids are minted; `None` sends requests without ids.
    pub fn with_id_strategy(mut self, ids: Option<IdStrategy>) -> Self {
        self.ids = ids;
        self
    }

    /// Replaces the observer fed every reply.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.invoker = self.invoker.with_observer(observer);
        self
    }

    /// Fails invocations that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &DynTransport { self.invoker.transport() }

    /// Invokes any method of the catalogue, or one defined by the caller.
    pub async fn call<P, T, E>(
        &self,
        method: &MethodDef<P, T, E>,
        params: Option<&P>,
    ) -> Result<T, InvokeError<E>>
    where
        P: Serialize + ?Sized + Sync,
        T: 'static,
        E: 'static,
    {
        let id = self.ids.map(IdStrategy::next);
        let invocation = self.invoker.invoke(method, params, id);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, invocation).await.unwrap_or_else(|_| {
                tracing::warn!(method = method.name, ?limit, "invocation timed out");
                Err(InvokeError::Timeout(limit))
            }),
            None => invocation.await,
        }
    }
}
