#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging utilities for ledgerwire clients.
//!
//! - [`init`] installs a `tracing` subscriber for applications that do not
//!   bring their own.
//! - [`Observer`] is the sink the client feeds every decoded reply to.
//!   Observers are fire-and-forget: they cannot fail and must not block, so
//!   they never change the outcome of an invocation.

use tracing_subscriber::EnvFilter;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive (e.g. `info`, `ledgerwire=debug`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self { Self { level: "info".to_string(), json: false } }
}

/// Installs a global fmt subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is kept.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if settings.json { builder.json().try_init() } else { builder.try_init() };
    installed.is_ok()
}

/// Sink for replies decoded by the client.
pub trait Observer: Send + Sync {
    /// Called with the raw success payload of a reply.
    fn response(&self, method: &str, id: Option<&str>, result: &str);

    /// Called with the error region of a reply.
    fn error(&self, method: &str, id: Option<&str>, code: i64, message: &str, data: Option<&str>);
}

/// Emits every observation as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn response(&self, method: &str, id: Option<&str>, result: &str) {
        tracing::debug!(target: "ledgerwire::response", method, id, result, "reply");
    }

    fn error(&self, method: &str, id: Option<&str>, code: i64, message: &str, data: Option<&str>) {
        tracing::debug!(target: "ledgerwire::response", method, id, code, message, data, "error reply");
    }
}

/// Discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn response(&self, _method: &str, _id: Option<&str>, _result: &str) {}

    fn error(&self, _method: &str, _id: Option<&str>, _code: i64, _message: &str, _data: Option<&str>) {}
}
