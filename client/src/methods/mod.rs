//! The method catalogue.
//!
//! Each method is a [`MethodDef`](crate::MethodDef) constant. The
//! [`Client`](crate::Client) wraps each one in a typed async method, but the
//! constants can also be passed to [`Client::call`](crate::Client::call)
//! directly.

use envelope::ErrorPayload;
use serde::Deserialize;
use thiserror::Error;

use crate::DecodeError;

pub mod chain_sync;
pub mod ledger_state;
pub mod mempool;
pub mod transaction;

/// Code sent when a mempool query arrives before the mempool was acquired.
pub const MUST_ACQUIRE_MEMPOOL_FIRST: i64 = 4000;

/// The client must acquire a mempool snapshot before this query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Must acquire mempool first: {message}")]
pub struct MustAcquireMempoolFirst {
    /// Message sent by the node.
    pub message: String,
}

/// Decoder for [`MUST_ACQUIRE_MEMPOOL_FIRST`], shared by every table that
/// declares it.
pub(crate) fn must_acquire_mempool_first<E>(error: &ErrorPayload) -> Result<E, DecodeError>
where
    E: From<MustAcquireMempoolFirst>,
{
    Ok(MustAcquireMempoolFirst { message: error.message.clone() }.into())
}

/// Acknowledgement of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Released {
    /// What was released (`"ledgerState"`, `"mempool"`).
    pub released: String,
}
