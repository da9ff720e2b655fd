//! Mempool monitoring.
//!
//! Every query except `acquireMempool` runs against a snapshot taken by
//! `acquireMempool`. All five methods declare the same single error code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{must_acquire_mempool_first, MustAcquireMempoolFirst, Released, MUST_ACQUIRE_MEMPOOL_FIRST};
use crate::discriminated::decode_json;
use crate::invoker::{ErrorEntry, ErrorTable, MethodDef};
use crate::types::TransactionId;
use crate::{Client, InvokeError};

/// Declared errors of the mempool methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// See [`MustAcquireMempoolFirst`].
    #[error(transparent)]
    MustAcquireMempoolFirst(#[from] MustAcquireMempoolFirst),
}

/// Result of `acquireMempool`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MempoolAcquired {
    /// Always `"mempool"`.
    pub acquired: String,
    /// Slot at which the snapshot was taken.
    pub slot: u128,
}

/// Which transaction fields `nextTransaction` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFields {
    /// The full transaction instead of its id only.
    All,
}

/// Parameters of `nextTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NextTransactionParams {
    /// Omitted to receive ids only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<TransactionFields>,
}

/// Result of `nextTransaction`.
#[derive(Debug, Clone, Deserialize)]
pub struct NextTransaction {
    /// Next transaction of the snapshot, `None` once it is exhausted.
    pub transaction: Option<Box<envelope::RawValue>>,
}

/// A byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Bytes {
    /// Number of bytes.
    pub bytes: u64,
}

/// A transaction count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Count {
    /// Number of transactions.
    pub count: u64,
}

/// Result of `sizeOfMempool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MempoolSize {
    /// Capacity of the mempool.
    pub max_capacity: Bytes,
    /// Bytes currently used.
    pub current_size: Bytes,
    /// Transactions in the snapshot.
    pub transactions: Count,
}

const MEMPOOL_ERRORS: &[ErrorEntry<MempoolError>] = &[ErrorEntry {
    code: MUST_ACQUIRE_MEMPOOL_FIRST,
    decoders: &[must_acquire_mempool_first::<MempoolError>],
}];

/// `acquireMempool`
pub const ACQUIRE_MEMPOOL: MethodDef<(), MempoolAcquired, MempoolError> =
    MethodDef::new("acquireMempool", decode_json::<MempoolAcquired>, ErrorTable::new(MEMPOOL_ERRORS));

/// `nextTransaction`
pub const NEXT_TRANSACTION: MethodDef<NextTransactionParams, NextTransaction, MempoolError> =
    MethodDef::new("nextTransaction", decode_json::<NextTransaction>, ErrorTable::new(MEMPOOL_ERRORS));

/// `hasTransaction`
pub const HAS_TRANSACTION: MethodDef<TransactionId, bool, MempoolError> =
    MethodDef::new("hasTransaction", decode_json::<bool>, ErrorTable::new(MEMPOOL_ERRORS));

/// `sizeOfMempool`
pub const SIZE_OF_MEMPOOL: MethodDef<(), MempoolSize, MempoolError> =
    MethodDef::new("sizeOfMempool", decode_json::<MempoolSize>, ErrorTable::new(MEMPOOL_ERRORS));

/// `releaseMempool`
pub const RELEASE_MEMPOOL: MethodDef<(), Released, MempoolError> =
    MethodDef::new("releaseMempool", decode_json::<Released>, ErrorTable::new(MEMPOOL_ERRORS));

impl Client {
    /// Takes a snapshot of the mempool.
    pub async fn acquire_mempool(&self) -> Result<MempoolAcquired, InvokeError<MempoolError>> {
        self.call(&ACQUIRE_MEMPOOL, None).await
    }

    /// Next transaction of the acquired snapshot.
    pub async fn next_transaction(
        &self,
        fields: Option<TransactionFields>,
    ) -> Result<NextTransaction, InvokeError<MempoolError>> {
        let params = NextTransactionParams { fields };
        self.call(&NEXT_TRANSACTION, Some(&params)).await
    }

    /// Whether the acquired snapshot contains transaction `id`.
    pub async fn has_transaction(
        &self,
        id: impl Into<String>,
    ) -> Result<bool, InvokeError<MempoolError>> {
        let params = TransactionId { id: id.into() };
        self.call(&HAS_TRANSACTION, Some(&params)).await
    }

    /// Size of the acquired snapshot.
    pub async fn size_of_mempool(&self) -> Result<MempoolSize, InvokeError<MempoolError>> {
        self.call(&SIZE_OF_MEMPOOL, None).await
    }

    /// Releases the acquired snapshot.
    pub async fn release_mempool(&self) -> Result<Released, InvokeError<MempoolError>> {
        self.call(&RELEASE_MEMPOOL, None).await
    }
}
