#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `ledgerwire-http`: Unary HTTP Transport Backend
//!
//! This crate provides the request/response implementation of the
//! [`transport::Transport`] trait: every round trip is one HTTP POST.
//!
//! ## Overview
//!
//! - Implements [`HttpTransport`], a thin wrapper over [`reqwest::Client`]
//!   (which pools connections between calls)
//! - Supports both authenticated and unauthenticated endpoints
//! - Returns the response body untouched; a status outside 200..=299 is a
//!   [`TransportError::HttpStatus`] carrying the body for diagnostics
//! - Never follows redirects: a 3xx reply is reported like any other
//!   unsuccessful status
//!
//! ## Example
//! ```no_run
//! use ledgerwire_http::HttpTransport;
//! use transport::Transport;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = HttpTransport::new("http://127.0.0.1:1337").unwrap();
//!
//! let reply = transport
//!     .round_trip(r#"{"jsonrpc":"2.0","method":"queryNetwork/tip"}"#.to_string())
//!     .await
//!     .unwrap();
//! println!("{}", reply);
//! # });
//! ```

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use transport::{Transport, TransportError};

/// A concrete implementation of the [`Transport`] trait using HTTP.
///
/// Unlike the client layer, `HttpTransport` performs no envelope parsing:
/// it posts the request text and hands back the response text.
#[derive(Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client used to perform requests.
    client: reqwest::Client,
    /// The full URL of the JSON-RPC endpoint (e.g. `http://127.0.0.1:1337`).
    url: String,
    /// Optional basic authentication credentials `(username, password)`.
    auth: Option<(String, String)>,
}

impl HttpTransport {
    /// Constructs a new `HttpTransport` targeting the provided URL.
    ///
    /// This variant does **not** use authentication.
    ///
    /// # Errors
    /// [`TransportError::Transport`] if the HTTP client cannot be initialized.
    ///
    /// # Example
    /// ```
    /// use ledgerwire_http::HttpTransport;
    /// use transport::Transport;
    ///
    /// let transport = HttpTransport::new("http://127.0.0.1:1337").unwrap();
    /// assert_eq!(transport.endpoint(), "http://127.0.0.1:1337");
    /// ```
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self { client: build_client()?, url: url.into(), auth: None })
    }

    /// Constructs a new `HttpTransport` with basic authentication.
    pub fn with_auth(
        url: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let url = url.into();
        tracing::trace!(%url, "initializing authenticated HTTP transport");
        Ok(Self { client: build_client()?, url, auth: Some((user.into(), pass.into())) })
    }
}

/// Pooled client that hands 3xx replies back instead of following them.
fn build_client() -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().map_err(|e| {
        tracing::error!("HTTP Transport - Client setup failed: {}", e);
        classify(e)
    })
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::ConnectionRefused(err.to_string())
    } else if err.is_decode() || err.is_body() {
        TransportError::Decoding(err.to_string())
    } else {
        TransportError::Transport(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Posts one request envelope and returns the response body.
    ///
    /// # Errors
    /// - [`TransportError::ConnectionRefused`] if the endpoint cannot be reached
    /// - [`TransportError::HttpStatus`] if the status is outside 200..=299
    /// - [`TransportError::Decoding`] if the body cannot be read as text
    /// - [`TransportError::Transport`] for any other client failure
    async fn round_trip(&self, request: String) -> Result<String, TransportError> {
        tracing::trace!(url = %self.url, body = %request, "→ POST");

        let mut req =
            self.client.post(&self.url).header(CONTENT_TYPE, "application/json").body(request);
        if let Some((u, p)) = &self.auth {
            req = req.basic_auth(u, Some(p));
        }

        let resp = req.send().await.map_err(|e| {
            tracing::error!("HTTP Transport - Request failed: {}", e);
            classify(e)
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            tracing::error!("HTTP Transport - Failed to read body: {}", e);
            classify(e)
        })?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "HTTP Transport - Unsuccessful status");
            return Err(TransportError::HttpStatus { status: status.as_u16(), body: text });
        }

        tracing::trace!(url = %self.url, body = %text, "← response");
        Ok(text)
    }

    /// Returns the configured JSON-RPC endpoint URL.
    fn endpoint(&self) -> &str { &self.url }
}
