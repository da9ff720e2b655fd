//! Control flow shared by every method.

mod common;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use client::discriminated::decode_json;
use client::methods::chain_sync::{ChainSyncError, NEXT_BLOCK};
use client::methods::ledger_state::QUERY_NETWORK_TIP;
use client::types::PointOrOrigin;
use client::{Client, ErrorTable, InvokeError, Invoker, MethodDef};
use common::{reply, MockTransport, RecordingObserver, Seen};
use envelope::{CorrelationId, EnvelopeError, IdStrategy};
use serde_json::json;
use transport::TransportError;

#[tokio::test]
async fn test_request_carries_method_and_id() {
    let mock = MockTransport::replying(json!("origin"));
    let client = Client::new(mock.clone()).with_id_strategy(Some(IdStrategy::Uuid));

    let tip = client.network_tip().await.expect("network tip");
    assert_eq!(tip, PointOrOrigin::Origin);

    let sent = envelope::decode_request(&mock.requests()[0]).expect("request");
    assert_eq!(sent.method, "queryNetwork/tip");
    assert!(matches!(sent.id, Some(CorrelationId::Text(ref s)) if s.len() == 36));
    assert!(sent.params.is_none());
}

#[tokio::test]
async fn test_no_id_strategy_sends_no_id() {
    let mock = MockTransport::replying(json!("origin"));
    let client = Client::new(mock.clone()).with_id_strategy(None);

    client.network_tip().await.expect("network tip");
    let sent = envelope::decode_request(&mock.requests()[0]).expect("request");
    assert!(sent.id.is_none());
}

#[tokio::test]
async fn test_method_echo_mismatch() {
    let mock = MockTransport::new(|request| {
        let mut other = request.clone();
        other.method = "queryLedgerState/tip".to_string();
        Ok(reply(&other, "result", json!("origin")))
    });
    let client = Client::new(mock);

    match client.network_tip().await.expect_err("wrong method") {
        InvokeError::InvalidMethod { expected, actual } => {
            assert_eq!(expected, "queryNetwork/tip");
            assert_eq!(actual, "queryLedgerState/tip");
        }
        other => panic!("expected InvalidMethod variant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_id_must_be_echoed() {
    let mock = MockTransport::new(|request| {
        let mut other = request.clone();
        other.id = Some(CorrelationId::from("someone-else"));
        Ok(reply(&other, "result", json!("origin")))
    });
    let client = Client::new(mock);

    match client.network_tip().await.expect_err("wrong id") {
        InvokeError::InvalidResponse { method, reason } => {
            assert_eq!(method, "queryNetwork/tip");
            assert!(reason.contains("someone-else"), "{}", reason);
        }
        other => panic!("expected InvalidResponse variant, got {:?}", other),
    }

    let silent = MockTransport::new(|request| {
        let mut other = request.clone();
        other.id = None;
        Ok(reply(&other, "result", json!("origin")))
    });
    let err = Client::new(silent).network_tip().await.expect_err("missing id");
    assert!(matches!(err, InvokeError::InvalidResponse { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_malformed_reply() {
    let both = MockTransport::new(|request| {
        let method = serde_json::to_string(&request.method).expect("method");
        Ok(format!(r#"{{"method":{},"result":1,"error":{{"code":1,"message":"x"}}}}"#, method))
    });
    let err = Client::new(both).with_id_strategy(None).network_tip().await.expect_err("both");
    assert!(
        matches!(err, InvokeError::MalformedEnvelope(EnvelopeError::Malformed(_))),
        "got {:?}",
        err
    );

    let garbage = MockTransport::new(|_| Ok("<html>".to_string()));
    let err = Client::new(garbage).network_tip().await.expect_err("not json");
    assert!(matches!(err, InvokeError::MalformedEnvelope(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_transport_error_is_propagated_unchanged() {
    let mock = MockTransport::new(|_| Err(TransportError::HttpStatus { status: 503, body: "busy".to_string() }));
    let client = Client::new(mock.clone());

    match client.next_block().await.expect_err("unavailable") {
        InvokeError::Transport(TransportError::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("expected Transport variant, got {:?}", other),
    }
    assert_eq!(mock.requests().len(), 1, "never retried");
}

#[tokio::test]
async fn test_unknown_code_is_reported_verbatim() {
    let mock = MockTransport::failing(-32601, "no such method", None);
    let client = Client::new(mock);

    match client.next_block().await.expect_err("unknown code") {
        InvokeError::UnexpectedErrorCode { method, code, message } => {
            assert_eq!(method, "nextBlock");
            assert_eq!(code, -32601);
            assert_eq!(message, "no such method");
        }
        other => panic!("expected UnexpectedErrorCode variant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_declared_code_with_undecodable_data() {
    let mock = MockTransport::failing(1000, "not found", Some(json!({"tip": 12})));
    let client = Client::new(mock);

    let err = client.find_intersection(vec![PointOrOrigin::Origin]).await.expect_err("bad data");
    match err {
        InvokeError::InvalidResponse { method, reason } => {
            assert_eq!(method, "findIntersection");
            assert!(reason.contains("1000"), "{}", reason);
        }
        other => panic!("expected InvalidResponse variant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_result() {
    let mock = MockTransport::replying(json!({"direction": "upward"}));
    let client = Client::new(mock);

    match client.next_block().await.expect_err("unknown direction") {
        InvokeError::InvalidResponse { method, reason } => {
            assert_eq!(method, "nextBlock");
            assert!(reason.contains("upward"), "{}", reason);
        }
        other => panic!("expected InvalidResponse variant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_encoding_failure_never_reaches_transport() {
    const LIST_PARAMS: MethodDef<Vec<u32>, bool, Infallible> =
        MethodDef::new("custom", decode_json::<bool>, ErrorTable::empty());

    let mock = MockTransport::replying(json!(true));
    let client = Client::new(mock.clone());

    let err = client.call(&LIST_PARAMS, Some(&vec![1, 2])).await.expect_err("params not an object");
    assert!(matches!(err, InvokeError::Encoding(EnvelopeError::ParamsNotObject(_))), "got {:?}", err);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_observer_sees_results_and_errors() {
    let observer = Arc::new(RecordingObserver::default());
    let ok = MockTransport::replying(json!("origin"));
    let client = Client::new(ok)
        .with_id_strategy(Some(IdStrategy::Timestamp))
        .with_observer(observer.clone());
    client.network_tip().await.expect("tip");

    let failing = MockTransport::failing(4000, "acquire first", Some(json!({"hint": 1})));
    let client = Client::new(failing).with_observer(observer.clone());
    let _ = client.next_block().await;

    let seen = observer.seen.lock().expect("seen").clone();
    assert_eq!(seen.len(), 2);
    match &seen[0] {
        Seen::Response { method, id, result } => {
            assert_eq!(method, "queryNetwork/tip");
            assert!(id.as_deref().is_some_and(|id| id.parse::<i64>().is_ok()));
            assert_eq!(result, "\"origin\"");
        }
        other => panic!("expected a response, got {:?}", other),
    }
    assert_eq!(
        seen[1],
        Seen::Error {
            method: "nextBlock".to_string(),
            code: 4000,
            data: Some(r#"{"hint":1}"#.to_string()),
        }
    );
}

#[tokio::test]
async fn test_timeout() {
    let mock = MockTransport::slow(Duration::from_millis(500), json!("origin"));
    let client = Client::new(mock).with_timeout(Duration::from_millis(20));

    match client.network_tip().await.expect_err("too slow") {
        InvokeError::Timeout(limit) => assert_eq!(limit, Duration::from_millis(20)),
        other => panic!("expected Timeout variant, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invoker_is_usable_directly() {
    let mock = MockTransport::failing(4000, "acquire first", None);
    let invoker = Invoker::new(mock);

    let err = invoker.invoke(&NEXT_BLOCK, None, Some(CorrelationId::from(7))).await.expect_err("4000");
    assert!(matches!(err, InvokeError::Method(ChainSyncError::MustAcquireMempoolFirst(_))));

    let ok = Invoker::new(MockTransport::replying(json!({"slot": 5, "id": "ab"})));
    let tip = ok.invoke(&QUERY_NETWORK_TIP, None, None).await.expect("tip");
    assert!(matches!(tip, PointOrOrigin::Point(ref p) if p.slot == 5));
}
