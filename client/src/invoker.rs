//! Generic invocation of a remote method.
//!
//! Every method runs through the same control flow in [`Invoker::invoke`];
//! what differs between methods is data, captured in a [`MethodDef`]:
//! the method name, how to decode its result, and which error codes it
//! declares.

use std::marker::PhantomData;
use std::sync::Arc;

use envelope::{Body, CorrelationId, ErrorPayload, RawValue};
use logging::{Observer, TracingObserver};
use serde::Serialize;
use transport::DynTransport;

use crate::discriminated::DecodeFn;
use crate::{DecodeError, InvokeError};

/// Decoder turning an error region into a method's error type.
pub type ErrorDecodeFn<E> = fn(&ErrorPayload) -> Result<E, DecodeError>;

/// Decoders registered for one error code, tried in order.
#[derive(Debug)]
pub struct ErrorEntry<E: 'static> {
    /// Error code as sent by the node.
    pub code: i64,
    /// Candidate decoders; the first that succeeds wins.
    pub decoders: &'static [ErrorDecodeFn<E>],
}

/// Static table of the error codes a method declares.
#[derive(Debug)]
pub struct ErrorTable<E: 'static> {
    entries: &'static [ErrorEntry<E>],
}

impl<E: 'static> ErrorTable<E> {
    /// Table over `entries`.
    pub const fn new(entries: &'static [ErrorEntry<E>]) -> Self { Self { entries } }

    /// A table declaring no codes.
    pub const fn empty() -> Self { Self { entries: &[] } }

    /// Decoders registered for `code`.
    pub fn lookup(&self, code: i64) -> Option<&'static [ErrorDecodeFn<E>]> {
        self.entries.iter().find(|entry| entry.code == code).map(|entry| entry.decoders)
    }

    /// Declared codes, in table order.
    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ { self.entries.iter().map(|e| e.code) }

    /// Maps an error region to the invocation error it stands for.
    pub fn resolve(&self, method: &str, error: &ErrorPayload) -> InvokeError<E> {
        let Some(decoders) = self.lookup(error.code) else {
            return InvokeError::UnexpectedErrorCode {
                method: method.to_string(),
                code: error.code,
                message: error.message.clone(),
            };
        };

        let mut reasons = Vec::with_capacity(decoders.len());
        for decode in decoders {
            match decode(error) {
                Ok(e) => return InvokeError::Method(e),
                Err(e) => reasons.push(e.to_string()),
            }
        }
        InvokeError::InvalidResponse {
            method: method.to_string(),
            reason: format!("error {} matched no declared shape: {}", error.code, reasons.join("; ")),
        }
    }
}

/// A remote method described as data.
///
/// `P` is the parameter type, `T` the decoded result and `E` the method's
/// declared error type.
pub struct MethodDef<P: ?Sized, T: 'static, E: 'static> {
    /// Wire name of the method.
    pub name: &'static str,
    /// Decoder for the result region.
    pub decode: DecodeFn<T>,
    /// Declared error codes.
    pub errors: ErrorTable<E>,
    params: PhantomData<fn(&P)>,
}

impl<P: ?Sized, T: 'static, E: 'static> MethodDef<P, T, E> {
    /// Describes a method.
    pub const fn new(name: &'static str, decode: DecodeFn<T>, errors: ErrorTable<E>) -> Self {
        Self { name, decode, errors, params: PhantomData }
    }
}

impl<P: ?Sized, T: 'static, E: 'static> std::fmt::Debug for MethodDef<P, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("codes", &self.errors.codes().collect::<Vec<_>>())
            .finish()
    }
}

/// Decodes the `data` member of an error region.
pub fn error_data<D: serde::de::DeserializeOwned>(error: &ErrorPayload) -> Result<D, DecodeError> {
    let data = error
        .data
        .as_deref()
        .ok_or_else(|| DecodeError::new(format!("error {} carries no data", error.code)))?;
    Ok(serde_json::from_str(data.get())?)
}

/// Runs method invocations over one transport.
///
/// The invoker keeps no state between calls; it can be shared freely.
#[derive(Clone)]
pub struct Invoker {
    transport: DynTransport,
    observer: Arc<dyn Observer>,
}

impl Invoker {
    /// Invoker reporting to a [`TracingObserver`].
    pub fn new(transport: DynTransport) -> Self {
        Self { transport, observer: Arc::new(TracingObserver) }
    }

    /// Replaces the observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &DynTransport { &self.transport }

    /// Invokes `method` with optional parameters and correlation id.
    ///
    /// # Errors
    /// - [`InvokeError::Encoding`] if the request cannot be built
    /// - [`InvokeError::Transport`] if the round trip fails
    /// - [`InvokeError::MalformedEnvelope`] if the reply is not an envelope
    /// - [`InvokeError::InvalidMethod`] if the reply names another method
    /// - [`InvokeError::InvalidResponse`] if the id is not echoed or the
    ///   payload does not decode
    /// - [`InvokeError::Method`] / [`InvokeError::UnexpectedErrorCode`] for
    ///   error replies with a declared / undeclared code
    pub async fn invoke<P, T, E>(
        &self,
        method: &MethodDef<P, T, E>,
        params: Option<&P>,
        id: Option<CorrelationId>,
    ) -> Result<T, InvokeError<E>>
    where
        P: Serialize + ?Sized + Sync,
        T: 'static,
        E: 'static,
    {
        let request =
            envelope::encode(method.name, params, id.as_ref()).map_err(InvokeError::Encoding)?;
        tracing::trace!(method = method.name, request = %request, "sending request");

        let reply = self.transport.round_trip(request).await.map_err(|e| {
            tracing::warn!(method = method.name, endpoint = self.transport.endpoint(), error = %e, "round trip failed");
            InvokeError::Transport(e)
        })?;
        tracing::trace!(method = method.name, reply = %reply, "received reply");

        let response = envelope::decode(&reply).map_err(InvokeError::MalformedEnvelope)?;

        if response.method != method.name {
            return Err(InvokeError::InvalidMethod {
                expected: method.name.to_string(),
                actual: response.method,
            });
        }
        if let Some(sent) = &id {
            if response.id.as_ref() != Some(sent) {
                let echoed = response.id.as_ref().map_or("nothing".to_string(), ToString::to_string);
                return Err(InvokeError::InvalidResponse {
                    method: method.name.to_string(),
                    reason: format!("sent id {} but reply carries {}", sent, echoed),
                });
            }
        }

        let echoed = response.id.as_ref().map(ToString::to_string);
        match response.body {
            Body::Error(error) => {
                self.observer.error(
                    method.name,
                    echoed.as_deref(),
                    error.code,
                    &error.message,
                    error.data.as_deref().map(RawValue::get),
                );
                tracing::debug!(method = method.name, code = error.code, "method returned an error");
                Err(method.errors.resolve(method.name, &error))
            }
            Body::Result(raw) => {
                self.observer.response(method.name, echoed.as_deref(), raw.get());
                (method.decode)(&raw).map_err(|e| InvokeError::InvalidResponse {
                    method: method.name.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker").field("endpoint", &self.transport.endpoint()).finish()
    }
}
