//! Connection lifecycle of a persistent WebSocket.
//!
//! A connection moves `Open → Closing → Closed` and never back. The state is
//! kept in an atomic so that it can be checked without waiting on an
//! in-flight read.
//!
//! [`close_error`] explains a failure *after* a send or receive has already
//! failed; it never pre-empts I/O that is in progress.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use transport::TransportError;

/// Observable state of a duplex connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Frames may be sent and received.
    Open,
    /// A close was initiated locally or by the peer.
    Closing,
    /// The connection is gone; every operation fails with [`TransportError::Closed`].
    Closed,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ConnectionState::Open,
            1 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Open => 0,
            ConnectionState::Closing => 1,
            ConnectionState::Closed => 2,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self { Self { state: AtomicU8::new(ConnectionState::Open.as_u8()) } }

    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Fails with [`TransportError::Closed`] unless the connection is open.
    pub(crate) fn ensure_open(&self) -> Result<(), TransportError> {
        match self.state() {
            ConnectionState::Open => Ok(()),
            ConnectionState::Closing | ConnectionState::Closed => Err(TransportError::Closed),
        }
    }

    /// Moves `Open → Closing`. Returns `false` if a close was already under way.
    pub(crate) fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Open.as_u8(),
                ConnectionState::Closing.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn finish_close(&self) {
        self.state.store(ConnectionState::Closed.as_u8(), Ordering::Release);
    }
}

/// Maps the close frame observed on a failed operation to a transport error.
///
/// | close code | error |
/// |---|---|
/// | normal (1000) or no status | [`TransportError::Closed`] |
/// | going away (1001) | [`TransportError::Disconnected`] |
/// | unsupported data (1003), invalid payload (1007) | [`TransportError::ConnectionError`] |
/// | anything else | [`TransportError::Transport`] |
pub fn close_error(frame: Option<&CloseFrame<'_>>) -> TransportError {
    let Some(frame) = frame else {
        return TransportError::Closed;
    };

    match frame.code {
        CloseCode::Normal | CloseCode::Status => TransportError::Closed,
        CloseCode::Away => TransportError::Disconnected(describe(frame)),
        CloseCode::Unsupported | CloseCode::Invalid => TransportError::ConnectionError(describe(frame)),
        _ => TransportError::Transport(describe(frame)),
    }
}

fn describe(frame: &CloseFrame<'_>) -> String {
    format!("peer closed with code {}: {}", u16::from(frame.code), frame.reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: CloseCode) -> CloseFrame<'static> { CloseFrame { code, reason: "bye".into() } }

    #[test]
    fn test_transitions() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ConnectionState::Open);
        assert!(lifecycle.ensure_open().is_ok());

        assert!(lifecycle.begin_close());
        assert_eq!(lifecycle.state(), ConnectionState::Closing);
        assert!(matches!(lifecycle.ensure_open(), Err(TransportError::Closed)));
        assert!(!lifecycle.begin_close());

        lifecycle.finish_close();
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
        assert!(!lifecycle.begin_close());
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_close_code_mapping() {
        assert!(matches!(close_error(None), TransportError::Closed));
        assert!(matches!(close_error(Some(&frame(CloseCode::Normal))), TransportError::Closed));
        assert!(matches!(
            close_error(Some(&frame(CloseCode::Away))),
            TransportError::Disconnected(ref m) if m.contains("1001")
        ));
        assert!(matches!(
            close_error(Some(&frame(CloseCode::Unsupported))),
            TransportError::ConnectionError(_)
        ));
        assert!(matches!(
            close_error(Some(&frame(CloseCode::Invalid))),
            TransportError::ConnectionError(_)
        ));
        assert!(matches!(
            close_error(Some(&frame(CloseCode::Library(4000)))),
            TransportError::Transport(ref m) if m.contains("4000")
        ));
        assert!(matches!(close_error(Some(&frame(CloseCode::Error))), TransportError::Transport(_)));
    }
}
