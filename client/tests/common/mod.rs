//! Scripted transports shared by the client tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use envelope::{decode_request, RequestEnvelope};
use logging::Observer;
use serde_json::{json, Value};
use transport::{Transport, TransportError};

type Script = Box<dyn Fn(&RequestEnvelope) -> Result<String, TransportError> + Send + Sync>;

/// Answers each request with whatever its script produces.
pub struct MockTransport {
    script: Script,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(
        script: impl Fn(&RequestEnvelope) -> Result<String, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self { script: Box::new(script), delay: None, requests: Mutex::new(Vec::new()) })
    }

    /// Replies with `result` for whatever method was requested, echoing the id.
    pub fn replying(result: Value) -> Arc<Self> {
        Self::new(move |request| Ok(reply(request, "result", result.clone())))
    }

    /// Replies with an error region, echoing method and id.
    pub fn failing(code: i64, message: &str, data: Option<Value>) -> Arc<Self> {
        let mut error = json!({"code": code, "message": message});
        if let Some(data) = data {
            error["data"] = data;
        }
        Self::new(move |request| Ok(reply(request, "error", error.clone())))
    }

    /// Replies with `text` as the result region, verbatim.
    pub fn replying_raw(text: &'static str) -> Arc<Self> {
        Self::new(move |request| Ok(reply_raw(request, "result", text)))
    }

    /// Like [`MockTransport::replying`], after `delay`.
    pub fn slow(delay: Duration, result: Value) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(move |request| Ok(reply(request, "result", result.clone()))),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<String> { self.requests.lock().expect("requests lock").clone() }
}

/// A well-formed reply to `request` carrying `value` under `region`.
pub fn reply(request: &RequestEnvelope, region: &str, value: Value) -> String {
    reply_raw(request, region, &value.to_string())
}

/// Like [`reply`], with the region given as JSON text so that numbers keep
/// their exact digits.
pub fn reply_raw(request: &RequestEnvelope, region: &str, text: &str) -> String {
    let method = serde_json::to_string(&request.method).expect("method");
    let id = match &request.id {
        Some(id) => format!(",\"id\":{}", serde_json::to_string(id).expect("id")),
        None => String::new(),
    };
    format!("{{\"jsonrpc\":\"2.0\",\"method\":{},\"{}\":{}{}}}", method, region, text, id)
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, request: String) -> Result<String, TransportError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let parsed = decode_request(&request).expect("client sent a valid request");
        (self.script)(&parsed)
    }

    fn endpoint(&self) -> &str { "mock://node" }
}

/// One observed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Response { method: String, id: Option<String>, result: String },
    Error { method: String, code: i64, data: Option<String> },
}

/// Observer that records everything it is fed.
#[derive(Default)]
pub struct RecordingObserver {
    pub seen: Mutex<Vec<Seen>>,
}

impl Observer for RecordingObserver {
    fn response(&self, method: &str, id: Option<&str>, result: &str) {
        self.seen.lock().expect("seen lock").push(Seen::Response {
            method: method.to_string(),
            id: id.map(str::to_string),
            result: result.to_string(),
        });
    }

    fn error(&self, method: &str, _id: Option<&str>, code: i64, _message: &str, data: Option<&str>) {
        self.seen.lock().expect("seen lock").push(Seen::Error {
            method: method.to_string(),
            code,
            data: data.map(str::to_string),
        });
    }
}
