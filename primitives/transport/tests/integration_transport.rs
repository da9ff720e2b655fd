//! Integration tests for the shared transport API.
//!
//! These exercise consumer usage patterns without requiring a running node.

use std::sync::Arc;

use transport::{DynTransport, Transport, TransportError};

struct DummyTransport;

#[async_trait::async_trait]
impl transport::Transport for DummyTransport {
    async fn round_trip(&self, request: String) -> Result<String, TransportError> {
        if request.contains("fail") {
            Err(TransportError::Disconnected("dummy went away".to_string()))
        } else {
            Ok(request)
        }
    }

    fn endpoint(&self) -> &str { "dummy://" }
}

#[tokio::test]
async fn consumer_can_round_trip() {
    let t = DummyTransport;
    let reply = t.round_trip("ping".to_string()).await.expect("ok");
    assert_eq!(reply, "ping");
}

#[tokio::test]
async fn consumer_sees_transport_error() {
    let t: DynTransport = Arc::new(DummyTransport);
    let err = t.round_trip("fail".to_string()).await.expect_err("should err");
    match err {
        TransportError::Disconnected(msg) => assert!(msg.contains("dummy")),
        _ => panic!("unexpected error variant"),
    }
    assert_eq!(t.endpoint(), "dummy://");
}

#[tokio::test]
async fn shared_handle_forwards_to_inner_transport() {
    let shared = Arc::new(DummyTransport);
    let reply = shared.round_trip("echo".to_string()).await.expect("ok");
    assert_eq!(reply, "echo");
}
