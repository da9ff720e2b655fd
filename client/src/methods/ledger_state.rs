//! Ledger state acquisition and queries.

use std::convert::Infallible;

use envelope::{ErrorPayload, RawValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Released;
use crate::discriminated::{decode_json, Decode, TrialOrdered, Variant};
use crate::invoker::{error_data, ErrorEntry, ErrorTable, MethodDef};
use crate::types::{EraMismatch, Point, PointOrOrigin, ORIGIN};
use crate::{Client, DecodeError, InvokeError};

/// The requested point could not be acquired.
pub const ACQUIRE_LEDGER_STATE_FAILURE: i64 = 2000;
/// The query targets another era.
pub const ERA_MISMATCH: i64 = 2001;
/// The query does not exist in the current era.
pub const UNAVAILABLE_IN_CURRENT_ERA: i64 = 2002;
/// The acquired ledger state is too old to be queried.
pub const ACQUIRED_EXPIRED: i64 = 2003;

/// Parameters of `acquireLedgerState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquireLedgerStateParams {
    /// Point to acquire.
    pub point: PointOrOrigin,
}

/// Result of `acquireLedgerState`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerStateAcquired {
    /// Always `"ledgerState"`.
    pub acquired: String,
    /// The acquired point.
    pub point: PointOrOrigin,
}

/// Result of `queryLedgerState/tip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerTip {
    /// The ledger is at genesis.
    Origin,
    /// The ledger's tip.
    Point(Point),
    /// The node answered in-band that the query targets another era.
    EraMismatch(EraMismatch),
}

/// Declared errors of the ledger state methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerStateError {
    /// Acquisition failed.
    #[error("Failed to acquire ledger state: {message}")]
    AcquireFailure {
        /// Message sent by the node.
        message: String,
        /// Reason tag, when the node supplies one.
        failure: Option<String>,
    },
    /// The query targets another era.
    #[error("Era mismatch: query for {}, ledger in {}", .mismatch.query_era, .mismatch.ledger_era)]
    EraMismatch {
        /// Message sent by the node.
        message: String,
        /// Eras involved.
        mismatch: EraMismatch,
    },
    /// The query is not available in the current era.
    #[error("Unavailable in current era: {message}")]
    UnavailableInCurrentEra {
        /// Message sent by the node.
        message: String,
    },
    /// The acquired state expired.
    #[error("Acquired ledger state expired: {message}")]
    AcquiredExpired {
        /// Message sent by the node.
        message: String,
    },
}

fn ledger_origin(raw: &RawValue) -> Result<LedgerTip, DecodeError> {
    match decode_json::<String>(raw)? {
        s if s == ORIGIN => Ok(LedgerTip::Origin),
        s => Err(DecodeError::new(format!("expected {:?}, found {:?}", ORIGIN, s))),
    }
}

fn ledger_point(raw: &RawValue) -> Result<LedgerTip, DecodeError> {
    decode_json(raw).map(LedgerTip::Point)
}

fn ledger_era_mismatch(raw: &RawValue) -> Result<LedgerTip, DecodeError> {
    decode_json(raw).map(LedgerTip::EraMismatch)
}

const LEDGER_TIP_VARIANTS: &[Variant<LedgerTip>] =
    &[Variant { name: "origin", decode: ledger_origin }, Variant { name: "point", decode: ledger_point }];
const LEDGER_TIP_FALLBACKS: &[Variant<LedgerTip>] =
    &[Variant { name: "eraMismatch", decode: ledger_era_mismatch }];

/// Decoder for [`LedgerTip`].
pub const LEDGER_TIP: TrialOrdered<LedgerTip> =
    TrialOrdered::new(LEDGER_TIP_VARIANTS).with_fallbacks(LEDGER_TIP_FALLBACKS);

fn ledger_tip(raw: &RawValue) -> Result<LedgerTip, DecodeError> { LEDGER_TIP.decode(raw) }

fn acquire_failure(error: &ErrorPayload) -> Result<LedgerStateError, DecodeError> {
    #[derive(Deserialize)]
    struct Data {
        failure: String,
    }
    let failure = match error.data {
        Some(_) => Some(error_data::<Data>(error)?.failure),
        None => None,
    };
    Ok(LedgerStateError::AcquireFailure { message: error.message.clone(), failure })
}

fn era_mismatch(error: &ErrorPayload) -> Result<LedgerStateError, DecodeError> {
    let mismatch = error_data(error)?;
    Ok(LedgerStateError::EraMismatch { message: error.message.clone(), mismatch })
}

fn unavailable(error: &ErrorPayload) -> Result<LedgerStateError, DecodeError> {
    Ok(LedgerStateError::UnavailableInCurrentEra { message: error.message.clone() })
}

fn expired(error: &ErrorPayload) -> Result<LedgerStateError, DecodeError> {
    Ok(LedgerStateError::AcquiredExpired { message: error.message.clone() })
}

const ACQUIRE_ERRORS: &[ErrorEntry<LedgerStateError>] =
    &[ErrorEntry { code: ACQUIRE_LEDGER_STATE_FAILURE, decoders: &[acquire_failure] }];

const QUERY_ERRORS: &[ErrorEntry<LedgerStateError>] = &[
    ErrorEntry { code: ERA_MISMATCH, decoders: &[era_mismatch] },
    ErrorEntry { code: UNAVAILABLE_IN_CURRENT_ERA, decoders: &[unavailable] },
    ErrorEntry { code: ACQUIRED_EXPIRED, decoders: &[expired] },
];

/// `acquireLedgerState`
pub const ACQUIRE_LEDGER_STATE: MethodDef<
    AcquireLedgerStateParams,
    LedgerStateAcquired,
    LedgerStateError,
> = MethodDef::new(
    "acquireLedgerState",
    decode_json::<LedgerStateAcquired>,
    ErrorTable::new(ACQUIRE_ERRORS),
);

/// `releaseLedgerState`
pub const RELEASE_LEDGER_STATE: MethodDef<(), Released, LedgerStateError> =
    MethodDef::new("releaseLedgerState", decode_json::<Released>, ErrorTable::empty());

/// `queryLedgerState/tip`
pub const QUERY_LEDGER_TIP: MethodDef<(), LedgerTip, LedgerStateError> =
    MethodDef::new("queryLedgerState/tip", ledger_tip, ErrorTable::new(QUERY_ERRORS));

/// `queryNetwork/tip`
pub const QUERY_NETWORK_TIP: MethodDef<(), PointOrOrigin, Infallible> =
    MethodDef::new("queryNetwork/tip", decode_json::<PointOrOrigin>, ErrorTable::empty());

impl Client {
    /// Pins a ledger state so that subsequent queries see a consistent view.
    pub async fn acquire_ledger_state(
        &self,
        point: PointOrOrigin,
    ) -> Result<LedgerStateAcquired, InvokeError<LedgerStateError>> {
        let params = AcquireLedgerStateParams { point };
        self.call(&ACQUIRE_LEDGER_STATE, Some(&params)).await
    }

    /// Releases a previously acquired ledger state.
    pub async fn release_ledger_state(&self) -> Result<Released, InvokeError<LedgerStateError>> {
        self.call(&RELEASE_LEDGER_STATE, None).await
    }

    /// Tip of the ledger.
    pub async fn ledger_tip(&self) -> Result<LedgerTip, InvokeError<LedgerStateError>> {
        self.call(&QUERY_LEDGER_TIP, None).await
    }

    /// Tip of the network as seen by the node.
    pub async fn network_tip(&self) -> Result<PointOrOrigin, InvokeError<Infallible>> {
        self.call(&QUERY_NETWORK_TIP, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Box<RawValue> { RawValue::from_string(text.to_string()).expect("raw") }

    #[test]
    fn test_ledger_tip_variants_in_order() {
        assert_eq!(ledger_tip(&raw("\"origin\"")).expect("origin"), LedgerTip::Origin);
        assert_eq!(
            ledger_tip(&raw(r#"{"slot":18446744073709552000,"id":"cc"}"#)).expect("point"),
            LedgerTip::Point(Point { slot: 18_446_744_073_709_552_000, id: "cc".to_string() })
        );
        assert_eq!(
            ledger_tip(&raw(r#"{"queryEra":"alonzo","ledgerEra":"babbage"}"#)).expect("fallback"),
            LedgerTip::EraMismatch(EraMismatch {
                query_era: "alonzo".to_string(),
                ledger_era: "babbage".to_string(),
            })
        );
        assert!(ledger_tip(&raw("[]")).is_err());
    }

    #[test]
    fn test_acquire_failure_data_is_optional() {
        let without = ErrorPayload { code: 2000, message: "too old".to_string(), data: None };
        assert_eq!(
            acquire_failure(&without).expect("no data"),
            LedgerStateError::AcquireFailure { message: "too old".to_string(), failure: None }
        );

        let with = ErrorPayload {
            code: 2000,
            message: "too old".to_string(),
            data: Some(raw(r#"{"failure":"pointTooOld"}"#)),
        };
        assert_eq!(
            acquire_failure(&with).expect("data"),
            LedgerStateError::AcquireFailure {
                message: "too old".to_string(),
                failure: Some("pointTooOld".to_string()),
            }
        );
    }

    #[test]
    fn test_era_mismatch_display() {
        let err = era_mismatch(&ErrorPayload {
            code: ERA_MISMATCH,
            message: "mismatch".to_string(),
            data: Some(raw(r#"{"queryEra":"alonzo","ledgerEra":"babbage"}"#)),
        })
        .expect("decoded");
        assert_eq!(err.to_string(), "Era mismatch: query for alonzo, ledger in babbage");
    }
}
