//! Chain synchronization: locating an intersection and pulling blocks.

use envelope::{ErrorPayload, RawValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{must_acquire_mempool_first, MustAcquireMempoolFirst, MUST_ACQUIRE_MEMPOOL_FIRST};
use crate::discriminated::{decode_json, Decode, FieldDiscriminated, Variant};
use crate::invoker::{error_data, ErrorEntry, ErrorTable, MethodDef};
use crate::types::{PointOrOrigin, TipOrOrigin};
use crate::{Client, DecodeError, InvokeError};

/// None of the requested points is on the node's chain.
pub const INTERSECTION_NOT_FOUND: i64 = 1000;
/// The intersection search was interrupted by a rollback.
pub const INTERSECTION_INTERRUPTED: i64 = 1001;

/// Parameters of `findIntersection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindIntersectionParams {
    /// Candidate points, most recent first.
    pub points: Vec<PointOrOrigin>,
}

/// Result of `findIntersection`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Intersection {
    /// The most recent requested point that is on the chain.
    pub intersection: PointOrOrigin,
    /// The node's tip at the time of the search.
    pub tip: TipOrOrigin,
}

/// Result of `nextBlock`.
#[derive(Debug, Clone)]
pub enum NextBlock {
    /// A new block was appended.
    Forward {
        /// The block, left undecoded.
        block: Box<RawValue>,
        /// The node's tip.
        tip: TipOrOrigin,
    },
    /// The chain rolled back to `point`.
    Backward {
        /// Point to roll back to.
        point: PointOrOrigin,
        /// The node's tip.
        tip: TipOrOrigin,
    },
}

/// Declared errors of the chain synchronization methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainSyncError {
    /// No requested point is on the chain.
    #[error("Intersection not found: {message}")]
    IntersectionNotFound {
        /// Message sent by the node.
        message: String,
        /// The node's tip.
        tip: TipOrOrigin,
    },
    /// The search was interrupted.
    #[error("Intersection interrupted: {message}")]
    IntersectionInterrupted {
        /// Message sent by the node.
        message: String,
        /// The node's tip.
        tip: TipOrOrigin,
    },
    /// See [`MustAcquireMempoolFirst`].
    #[error(transparent)]
    MustAcquireMempoolFirst(#[from] MustAcquireMempoolFirst),
}

#[derive(Deserialize)]
struct RollForward {
    block: Box<RawValue>,
    tip: TipOrOrigin,
}

#[derive(Deserialize)]
struct RollBackward {
    point: PointOrOrigin,
    tip: TipOrOrigin,
}

#[derive(Deserialize)]
struct TipData {
    tip: TipOrOrigin,
}

fn forward(raw: &RawValue) -> Result<NextBlock, DecodeError> {
    let RollForward { block, tip } = decode_json(raw)?;
    Ok(NextBlock::Forward { block, tip })
}

fn backward(raw: &RawValue) -> Result<NextBlock, DecodeError> {
    let RollBackward { point, tip } = decode_json(raw)?;
    Ok(NextBlock::Backward { point, tip })
}

const DIRECTIONS: &[Variant<NextBlock>] =
    &[Variant { name: "forward", decode: forward }, Variant { name: "backward", decode: backward }];

/// Decoder for [`NextBlock`], keyed on `direction`.
pub const NEXT_BLOCK_RESULT: FieldDiscriminated<NextBlock> =
    FieldDiscriminated::new("direction", DIRECTIONS);

fn next_block(raw: &RawValue) -> Result<NextBlock, DecodeError> { NEXT_BLOCK_RESULT.decode(raw) }

fn intersection_not_found(error: &ErrorPayload) -> Result<ChainSyncError, DecodeError> {
    let TipData { tip } = error_data(error)?;
    Ok(ChainSyncError::IntersectionNotFound { message: error.message.clone(), tip })
}

fn intersection_interrupted(error: &ErrorPayload) -> Result<ChainSyncError, DecodeError> {
    let TipData { tip } = error_data(error)?;
    Ok(ChainSyncError::IntersectionInterrupted { message: error.message.clone(), tip })
}

const FIND_INTERSECTION_ERRORS: &[ErrorEntry<ChainSyncError>] = &[
    ErrorEntry { code: INTERSECTION_NOT_FOUND, decoders: &[intersection_not_found] },
    ErrorEntry { code: INTERSECTION_INTERRUPTED, decoders: &[intersection_interrupted] },
];

const NEXT_BLOCK_ERRORS: &[ErrorEntry<ChainSyncError>] = &[ErrorEntry {
    code: MUST_ACQUIRE_MEMPOOL_FIRST,
    decoders: &[must_acquire_mempool_first::<ChainSyncError>],
}];

/// `findIntersection`
pub const FIND_INTERSECTION: MethodDef<FindIntersectionParams, Intersection, ChainSyncError> =
    MethodDef::new(
        "findIntersection",
        decode_json::<Intersection>,
        ErrorTable::new(FIND_INTERSECTION_ERRORS),
    );

/// `nextBlock`
pub const NEXT_BLOCK: MethodDef<(), NextBlock, ChainSyncError> =
    MethodDef::new("nextBlock", next_block, ErrorTable::new(NEXT_BLOCK_ERRORS));

impl Client {
    /// Finds the most recent of `points` that is on the node's chain.
    pub async fn find_intersection(
        &self,
        points: Vec<PointOrOrigin>,
    ) -> Result<Intersection, InvokeError<ChainSyncError>> {
        let params = FindIntersectionParams { points };
        self.call(&FIND_INTERSECTION, Some(&params)).await
    }

    /// Requests the next chain event after the current intersection.
    pub async fn next_block(&self) -> Result<NextBlock, InvokeError<ChainSyncError>> {
        self.call(&NEXT_BLOCK, None).await
    }
}
