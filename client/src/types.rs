//! Chain positions shared by several methods.
//!
//! Slots are `u128` so that values past `u64::MAX` come back exactly as the
//! node sent them.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::discriminated::{decode_json, Decode, TrialOrdered, Variant};
use crate::DecodeError;

/// Literal used on the wire for the genesis position.
pub const ORIGIN: &str = "origin";

/// A block position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Absolute slot number.
    pub slot: u128,
    /// Block header hash, hex-encoded.
    pub id: String,
}

/// The tip of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tip {
    /// Absolute slot number.
    pub slot: u128,
    /// Block header hash, hex-encoded.
    pub id: String,
    /// Block height.
    pub height: u64,
}

/// A point, or the origin of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointOrOrigin {
    /// Before the first block.
    Origin,
    /// A concrete block.
    Point(Point),
}

/// A tip, or the origin of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TipOrOrigin {
    /// Empty chain.
    Origin,
    /// A concrete tip.
    Tip(Tip),
}

fn origin(raw: &RawValue) -> Result<(), DecodeError> {
    match decode_json::<String>(raw)? {
        s if s == ORIGIN => Ok(()),
        s => Err(DecodeError::new(format!("expected {:?}, found {:?}", ORIGIN, s))),
    }
}

fn origin_point(raw: &RawValue) -> Result<PointOrOrigin, DecodeError> {
    origin(raw).map(|()| PointOrOrigin::Origin)
}

fn point(raw: &RawValue) -> Result<PointOrOrigin, DecodeError> {
    decode_json(raw).map(PointOrOrigin::Point)
}

fn origin_tip(raw: &RawValue) -> Result<TipOrOrigin, DecodeError> {
    origin(raw).map(|()| TipOrOrigin::Origin)
}

fn tip(raw: &RawValue) -> Result<TipOrOrigin, DecodeError> { decode_json(raw).map(TipOrOrigin::Tip) }

const POINT_VARIANTS: &[Variant<PointOrOrigin>] =
    &[Variant { name: "origin", decode: origin_point }, Variant { name: "point", decode: point }];

const TIP_VARIANTS: &[Variant<TipOrOrigin>] =
    &[Variant { name: "origin", decode: origin_tip }, Variant { name: "tip", decode: tip }];

/// Decoder for [`PointOrOrigin`].
pub const POINT_OR_ORIGIN: TrialOrdered<PointOrOrigin> = TrialOrdered::new(POINT_VARIANTS);

/// Decoder for [`TipOrOrigin`].
pub const TIP_OR_ORIGIN: TrialOrdered<TipOrOrigin> = TrialOrdered::new(TIP_VARIANTS);

impl From<Point> for PointOrOrigin {
    fn from(point: Point) -> Self { PointOrOrigin::Point(point) }
}

impl From<Tip> for PointOrOrigin {
    fn from(tip: Tip) -> Self { PointOrOrigin::Point(Point { slot: tip.slot, id: tip.id }) }
}

impl From<TipOrOrigin> for PointOrOrigin {
    fn from(tip: TipOrOrigin) -> Self {
        match tip {
            TipOrOrigin::Origin => PointOrOrigin::Origin,
            TipOrOrigin::Tip(tip) => tip.into(),
        }
    }
}

impl Serialize for PointOrOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PointOrOrigin::Origin => serializer.serialize_str(ORIGIN),
            PointOrOrigin::Point(point) => point.serialize(serializer),
        }
    }
}

impl Serialize for TipOrOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TipOrOrigin::Origin => serializer.serialize_str(ORIGIN),
            TipOrOrigin::Tip(tip) => tip.serialize(serializer),
        }
    }
}

// Both go through a raw region so that nested u128 slots are parsed from the
// original digits rather than from a buffered value.
impl<'de> Deserialize<'de> for PointOrOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        POINT_OR_ORIGIN.decode(&raw).map_err(D::Error::custom)
    }
}

impl<'de> Deserialize<'de> for TipOrOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        TIP_OR_ORIGIN.decode(&raw).map_err(D::Error::custom)
    }
}

/// A serialized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cbor {
    /// Hex-encoded CBOR bytes.
    pub cbor: String,
}

/// A transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Hex-encoded transaction hash.
    pub id: String,
}

/// A request that targets a different era than the ledger is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraMismatch {
    /// Era the request was built for.
    pub query_era: String,
    /// Era the ledger is in.
    pub ledger_era: String,
}
