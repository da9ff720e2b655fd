//! Round trips against a scripted HTTP responder.
//!
//! The responder accepts exactly one connection, records the request it saw
//! and answers with a canned status and body.

use ledgerwire_http::HttpTransport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use transport::{Transport, TransportError};

struct SeenRequest {
    head: String,
    body: String,
}

async fn respond_once(
    status: &'static str,
    reply: &'static str,
) -> (String, oneshot::Receiver<SeenRequest>) {
    respond_once_with(status, "", reply).await
}

/// Like [`respond_once`], with extra header lines (each ending in `\r\n`).
async fn respond_once_with(
    status: &'static str,
    headers: &'static str,
    reply: &'static str,
) -> (String, oneshot::Receiver<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.expect("read");
            assert!(n > 0, "client hung up before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "client hung up before sending body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();

        let response = format!(
            "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            headers,
            reply.len(),
            reply,
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        let _ = tx.send(SeenRequest { head, body });
    });

    (url, rx)
}

#[tokio::test]
async fn test_success_body_is_returned_unchanged() {
    let reply = r#"{"jsonrpc":"2.0","method":"queryNetwork/tip","result":"origin"}"#;
    let (url, seen) = respond_once("200 OK", reply).await;
    let transport = HttpTransport::new(url).expect("client");

    let request = r#"{"jsonrpc":"2.0","method":"queryNetwork/tip"}"#.to_string();
    let text = transport.round_trip(request.clone()).await.expect("round trip");
    assert_eq!(text, reply);

    let seen = seen.await.expect("request recorded");
    assert!(seen.head.starts_with("POST "));
    assert!(seen.head.to_ascii_lowercase().contains("content-type: application/json"));
    assert_eq!(seen.body, request);
}

#[tokio::test]
async fn test_error_status_carries_raw_body() {
    // A JSON-RPC error body behind a 500 must not be interpreted here.
    let reply = r#"{"jsonrpc":"2.0","method":"nextBlock","error":{"code":4000,"message":"x"}}"#;
    let (url, _seen) = respond_once("500 Internal Server Error", reply).await;
    let transport = HttpTransport::new(url).expect("client");

    let err = transport.round_trip("{}".to_string()).await.expect_err("non-2xx");
    match err {
        TransportError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, reply);
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let (url, seen) = respond_once("202 Accepted", "").await;
    let transport = HttpTransport::with_auth(url, "user", "pass").expect("client");

    let text = transport.round_trip("{}".to_string()).await.expect("2xx is success");
    assert_eq!(text, "");

    let seen = seen.await.expect("request recorded");
    // base64("user:pass")
    assert!(seen.head.contains("dXNlcjpwYXNz"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new(format!("http://{}", addr)).expect("client");
    let err = transport.round_trip("{}".to_string()).await.expect_err("nobody listening");
    assert!(matches!(err, TransportError::ConnectionRefused(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let (url, seen) =
        respond_once_with("307 Temporary Redirect", "Location: /elsewhere\r\n", "redirect!").await;
    let transport = HttpTransport::new(url).expect("client");

    let err = transport.round_trip("{}".to_string()).await.expect_err("3xx");
    match err {
        TransportError::HttpStatus { status, body } => {
            assert_eq!(status, 307);
            assert_eq!(body, "redirect!");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(seen.await.expect("request recorded").head.starts_with("POST "));
}

#[tokio::test]
async fn test_success_range_boundaries() {
    let (url, _seen) = respond_once("299 Custom", "last success").await;
    let transport = HttpTransport::new(url).expect("client");
    assert_eq!(transport.round_trip("{}".to_string()).await.expect("299 is success"), "last success");

    let (url, _seen) = respond_once("300 Multiple Choices", "first failure").await;
    let transport = HttpTransport::new(url).expect("client");
    match transport.round_trip("{}".to_string()).await.expect_err("300 is a failure") {
        TransportError::HttpStatus { status, body } => {
            assert_eq!(status, 300);
            assert_eq!(body, "first failure");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}
