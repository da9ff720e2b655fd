#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `ledgerwire-websocket`: Duplex WebSocket Transport Backend
//!
//! This crate implements [`transport::Transport`] over one persistent
//! WebSocket connection. Each request is one text frame and each reply is the
//! next data frame the node sends back.
//!
//! ## Overview
//!
//! - [`WebSocketTransport::connect`] dials a `ws://` or `wss://` endpoint;
//!   [`WebSocketTransport::handshake`] runs the client handshake over any
//!   async byte stream.
//! - [`WebSocketTransport::send`] and [`WebSocketTransport::receive_one`]
//!   expose the frame-level operations; `round_trip` pairs them and holds the
//!   read side for its whole duration, so at most one request per connection
//!   awaits its reply.
//! - Binary frames are accepted when they are valid UTF-8. Frames and
//!   messages larger than [`MAX_FRAME_SIZE`] are rejected.
//! - [`lifecycle`] tracks `Open → Closing → Closed` and maps close codes to
//!   [`TransportError`]s.
//!
//! A round trip abandoned after its request was queued leaves a reply on the
//! wire. The transport remembers that and discards the reply when it
//! arrives, so later round trips stay correlated.

pub mod lifecycle;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::{CapacityError, Error as WsError};
use tokio_tungstenite::tungstenite::protocol::{Message, WebSocketConfig};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use transport::{Transport, TransportError, MAX_FRAME_SIZE};

pub use lifecycle::{close_error, ConnectionState};
use lifecycle::Lifecycle;

/// Frame limits applied to every connection.
pub fn frame_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_frame_size = Some(MAX_FRAME_SIZE);
    config.max_message_size = Some(MAX_FRAME_SIZE);
    config
}

struct Reader<S> {
    stream: SplitStream<WebSocketStream<S>>,
    /// Replies still owed to round trips that were abandoned.
    stale: usize,
}

/// Marks the reply as stale if the round trip is dropped while one is owed.
///
/// A reply is owed from the moment the request frame is queued on the sink,
/// even if flushing it has not finished.
struct Pending<'a, S> {
    reader: &'a mut Reader<S>,
    owed: bool,
}

impl<S> Drop for Pending<'_, S> {
    fn drop(&mut self) {
        if self.owed {
            self.reader.stale += 1;
        }
    }
}

enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// A [`Transport`] over a persistent WebSocket connection.
///
/// The transport exclusively owns the socket. Sending and receiving are
/// guarded separately so that a pending read never blocks [`close`](Self::close).
pub struct WebSocketTransport<S = MaybeTlsStream<TcpStream>> {
    url: String,
    lifecycle: Lifecycle,
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    reader: Mutex<Reader<S>>,
}

impl WebSocketTransport {
    /// Connects to a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    /// [`TransportError::ConnectionRefused`] if the endpoint cannot be reached
    /// or refuses the upgrade.
    pub async fn connect(url: impl Into<String>) -> Result<Self, TransportError> {
        let url = url.into();
        tracing::debug!(%url, "connecting WebSocket transport");

        let (stream, _response) =
            tokio_tungstenite::connect_async_with_config(url.as_str(), Some(frame_config()), false)
                .await
                .map_err(|e| {
                    tracing::error!("WebSocket Transport - Connect failed: {}", e);
                    handshake_error(e)
                })?;

        Ok(Self::from_stream(url, stream))
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Runs the client handshake over an already-established byte stream.
    pub async fn handshake(url: impl Into<String>, io: S) -> Result<Self, TransportError> {
        let url = url.into();
        let (stream, _response) =
            tokio_tungstenite::client_async_with_config(url.as_str(), io, Some(frame_config()))
                .await
                .map_err(handshake_error)?;
        Ok(Self::from_stream(url, stream))
    }

    /// Wraps an open WebSocket stream.
    ///
    /// The caller is responsible for having configured the stream with
    /// [`frame_config`]; oversized frames are rejected here regardless.
    pub fn from_stream(url: impl Into<String>, stream: WebSocketStream<S>) -> Self {
        let (sink, stream) = stream.split();
        Self {
            url: url.into(),
            lifecycle: Lifecycle::new(),
            sink: Mutex::new(sink),
            reader: Mutex::new(Reader { stream, stale: 0 }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState { self.lifecycle.state() }

    /// Writes one text frame.
    ///
    /// Fails immediately with [`TransportError::Closed`], without touching the
    /// socket, once the connection is closing or closed.
    pub async fn send(&self, text: String) -> Result<(), TransportError> {
        let mut queued = false;
        self.write_frame(text, &mut queued).await
    }

    /// Waits for the next data frame.
    ///
    /// Ping and pong frames are skipped. A close frame from the peer ends the
    /// connection and is reported through [`close_error`].
    pub async fn receive_one(&self) -> Result<String, TransportError> {
        let mut reader = self.reader.lock().await;
        self.read_reply(&mut reader).await
    }

    /// Initiates a graceful close.
    ///
    /// Closing a connection that is already closing or closed does nothing.
    pub async fn close(&self) -> Result<(), TransportError> {
        if !self.lifecycle.begin_close() {
            return Ok(());
        }
        tracing::debug!(url = %self.url, "closing WebSocket transport");

        let mut sink = self.sink.lock().await;
        let outcome = sink.close().await;
        self.lifecycle.finish_close();

        match outcome {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(map_ws_error(e)),
        }
    }

    /// Queues one text frame, sets `queued`, then flushes it.
    async fn write_frame(&self, text: String, queued: &mut bool) -> Result<(), TransportError> {
        self.lifecycle.ensure_open()?;
        tracing::trace!(url = %self.url, body = %text, "→ frame");

        let mut sink = self.sink.lock().await;
        sink.feed(Message::Text(text)).await.map_err(|e| self.fail(e))?;
        *queued = true;
        sink.flush().await.map_err(|e| self.fail(e))
    }

    async fn read_reply(&self, reader: &mut Reader<S>) -> Result<String, TransportError> {
        loop {
            self.lifecycle.ensure_open()?;

            let frame = match reader.stream.next().await {
                Some(Ok(Message::Text(text))) => Frame::Text(text),
                Some(Ok(Message::Binary(bytes))) => Frame::Binary(bytes),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {
                    continue
                }
                Some(Ok(Message::Close(frame))) => {
                    self.lifecycle.begin_close();
                    self.lifecycle.finish_close();
                    let err = close_error(frame.as_ref());
                    tracing::warn!(url = %self.url, "WebSocket Transport - Peer closed: {}", err);
                    return Err(err);
                }
                Some(Err(e)) => return Err(self.fail(e)),
                None => {
                    self.lifecycle.finish_close();
                    return Err(TransportError::Transport(
                        "connection ended without a close frame".to_string(),
                    ));
                }
            };

            if reader.stale > 0 {
                reader.stale -= 1;
                tracing::debug!(url = %self.url, "discarding reply to an abandoned request");
                continue;
            }

            let size = match &frame {
                Frame::Text(text) => text.len(),
                Frame::Binary(bytes) => bytes.len(),
            };
            if size > MAX_FRAME_SIZE {
                return Err(TransportError::FrameTooLarge { size, max: MAX_FRAME_SIZE });
            }

            let text = match frame {
                Frame::Text(text) => text,
                Frame::Binary(bytes) => String::from_utf8(bytes)
                    .map_err(|e| TransportError::Decoding(format!("binary frame: {}", e)))?,
            };
            tracing::trace!(url = %self.url, body = %text, "← frame");
            return Ok(text);
        }
    }

    /// Maps a socket failure and retires the connection.
    fn fail(&self, err: WsError) -> TransportError {
        self.lifecycle.finish_close();
        let err = map_ws_error(err);
        tracing::error!(url = %self.url, "WebSocket Transport - I/O failed: {}", err);
        err
    }
}

fn map_ws_error(err: WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        WsError::Capacity(CapacityError::MessageTooLong { size, max_size }) => {
            TransportError::FrameTooLarge { size, max: max_size }
        }
        WsError::Io(e) => match e.kind() {
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => TransportError::Disconnected(e.to_string()),
            _ => TransportError::Transport(e.to_string()),
        },
        other => TransportError::Transport(other.to_string()),
    }
}

fn handshake_error(err: WsError) -> TransportError {
    match err {
        WsError::Io(e) => TransportError::ConnectionRefused(e.to_string()),
        WsError::Http(response) => {
            TransportError::ConnectionRefused(format!("upgrade rejected with {}", response.status()))
        }
        other => TransportError::Transport(other.to_string()),
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Sends one frame and waits for the next reply on this connection.
    async fn round_trip(&self, request: String) -> Result<String, TransportError> {
        let mut reader = self.reader.lock().await;
        let mut pending = Pending { reader: &mut *reader, owed: false };
        if let Err(e) = self.write_frame(request, &mut pending.owed).await {
            pending.owed = false;
            return Err(e);
        }

        let reply = self.read_reply(&mut *pending.reader).await;
        pending.owed = false;
        reply
    }

    fn endpoint(&self) -> &str { &self.url }
}
