//! Envelope encoding and generic response decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::{CorrelationId, EnvelopeError, Result, JSONRPC_VERSION};

/// Structured error region of a response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    /// Numeric error code, interpreted per method.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details, left undecoded.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

/// The region carried by a response: exactly one of result or error.
#[derive(Debug, Clone)]
pub enum Body {
    /// Success payload, undecoded.
    Result(Box<RawValue>),
    /// Error payload.
    Error(ErrorPayload),
}

/// A decoded response envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Method name echoed by the node.
    pub method: String,
    /// Correlation id echoed by the node, if any.
    pub id: Option<CorrelationId>,
    /// Result or error region.
    pub body: Body,
}

/// A decoded request envelope.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Requested method.
    pub method: String,
    /// Correlation id attached to the request, if any.
    pub id: Option<CorrelationId>,
    /// Parameters object, undecoded.
    pub params: Option<Box<RawValue>>,
}

#[derive(Serialize)]
struct OutgoingRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a CorrelationId>,
}

/// Serializes a request envelope.
///
/// `params` must serialize to a JSON object; `params` and `id` are omitted
/// from the envelope when `None`.
pub fn encode<P>(method: &str, params: Option<&P>, id: Option<&CorrelationId>) -> Result<String>
where
    P: Serialize + ?Sized,
{
    let params = params
        .map(serde_json::value::to_raw_value)
        .transpose()
        .map_err(|e| EnvelopeError::Serialization(e.to_string()))?;

    if let Some(raw) = &params {
        if !raw.get().starts_with('{') {
            return Err(EnvelopeError::ParamsNotObject(raw.get().to_string()));
        }
    }

    let request =
        OutgoingRequest { jsonrpc: JSONRPC_VERSION, method, params: params.as_deref(), id };
    serde_json::to_string(&request).map_err(|e| EnvelopeError::Serialization(e.to_string()))
}

/// Decodes a response envelope without looking inside its payload.
///
/// # Errors
/// [`EnvelopeError::Malformed`] when the top level is not an object, the
/// `method` is missing or not a string, the version tag is wrong, the id is
/// neither string, integer nor null, the error region lacks `code`/`message`,
/// or when both or neither of `result` and `error` are present.
pub fn decode(text: &str) -> Result<Envelope> {
    let mut fields = fields_of(text)?;
    let (method, id) = header(&mut fields)?;

    let result = fields.remove("result");
    let error = match fields.remove("error") {
        Some(raw) if raw.get() != "null" => Some(
            serde_json::from_str::<ErrorPayload>(raw.get())
                .map_err(|e| malformed(format!("invalid error region: {}", e)))?,
        ),
        _ => None,
    };

    let body = match (result, error) {
        (Some(result), None) => Body::Result(result),
        (None, Some(error)) => Body::Error(error),
        (Some(_), Some(_)) => return Err(malformed("both result and error are present")),
        (None, None) => return Err(malformed("neither result nor error is present")),
    };

    Ok(Envelope { method, id, body })
}

/// Decodes a request envelope, as produced by [`encode`].
pub fn decode_request(text: &str) -> Result<RequestEnvelope> {
    let mut fields = fields_of(text)?;
    let (method, id) = header(&mut fields)?;
    let params = fields.remove("params").filter(|raw| raw.get() != "null");
    Ok(RequestEnvelope { method, id, params })
}

fn fields_of(text: &str) -> Result<HashMap<String, Box<RawValue>>> {
    serde_json::from_str(text).map_err(|e| malformed(format!("expected a JSON object: {}", e)))
}

fn header(
    fields: &mut HashMap<String, Box<RawValue>>,
) -> Result<(String, Option<CorrelationId>)> {
    if let Some(version) = fields.remove("jsonrpc") {
        match serde_json::from_str::<String>(version.get()) {
            Ok(v) if v == JSONRPC_VERSION => {}
            _ => return Err(malformed(format!("unsupported protocol version {}", version.get()))),
        }
    }

    let method = fields.remove("method").ok_or_else(|| malformed("missing method field"))?;
    let method = serde_json::from_str::<String>(method.get())
        .map_err(|_| malformed(format!("method field is not textual: {}", method.get())))?;

    let id = match fields.remove("id") {
        Some(raw) if raw.get() != "null" => Some(
            serde_json::from_str::<CorrelationId>(raw.get())
                .map_err(|_| malformed(format!("invalid id: {}", raw.get())))?,
        ),
        _ => None,
    };

    Ok((method, id))
}

fn malformed(reason: impl Into<String>) -> EnvelopeError { EnvelopeError::Malformed(reason.into()) }
