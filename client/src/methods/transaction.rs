//! Transaction submission and evaluation.

use envelope::{ErrorPayload, RawValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discriminated::decode_json;
use crate::invoker::{error_data, ErrorEntry, ErrorTable, MethodDef};
use crate::types::{Cbor, EraMismatch, TransactionId};
use crate::{Client, DecodeError, InvokeError};

/// Evaluation requested in an era that does not support scripts.
pub const INCOMPATIBLE_ERA: i64 = 3000;
/// The transaction was built for another era.
pub const SUBMIT_ERA_MISMATCH: i64 = 3005;
/// One or more scripts failed, or could not be found.
pub const SCRIPT_EXECUTION_FAILURE: i64 = 3010;

/// Parameters of `submitTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitTransactionParams {
    /// The signed transaction.
    pub transaction: Cbor,
}

/// Result of `submitTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submitted {
    /// Id of the accepted transaction.
    pub transaction: TransactionId,
}

/// Parameters of `evaluateTransaction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateTransactionParams {
    /// The transaction to evaluate.
    pub transaction: Cbor,
    /// Outputs not yet on chain that the transaction spends, passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_utxo: Option<Box<RawValue>>,
}

/// A script, identified by its position and purpose in the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Validator {
    /// Index within the purpose.
    pub index: u32,
    /// `spend`, `mint`, `publish`, `withdraw`, ...
    pub purpose: String,
}

/// Execution units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Budget {
    /// Memory units.
    pub memory: u64,
    /// CPU steps.
    pub cpu: u64,
}

/// Cost of running one script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Evaluation {
    /// The script evaluated.
    pub validator: Validator,
    /// Units it consumed.
    pub budget: Budget,
}

/// Why a script failed.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptError {
    /// Node-specific failure code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Structured details, left undecoded.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

/// One failed script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFailure {
    /// The script that failed.
    pub validator: Validator,
    /// Why it failed.
    pub error: ScriptError,
}

/// Declared errors of the transaction methods.
#[derive(Debug, Clone, Error)]
pub enum TransactionError {
    /// Scripts cannot be evaluated in the requested era.
    #[error("Incompatible era {era}: {message}")]
    IncompatibleEra {
        /// Message sent by the node.
        message: String,
        /// Era requested.
        era: String,
    },
    /// The transaction targets another era.
    #[error("Era mismatch: transaction for {}, ledger in {}", .mismatch.query_era, .mismatch.ledger_era)]
    EraMismatch {
        /// Message sent by the node.
        message: String,
        /// Eras involved.
        mismatch: EraMismatch,
    },
    /// Scripts ran and failed.
    #[error("{} script(s) failed: {message}", .failures.len())]
    ScriptFailures {
        /// Message sent by the node.
        message: String,
        /// Every failing script.
        failures: Vec<ScriptFailure>,
    },
    /// Scripts referenced by the transaction could not be found.
    #[error("{} script(s) missing: {message}", .scripts.len())]
    MissingScripts {
        /// Message sent by the node.
        message: String,
        /// The scripts that are missing.
        scripts: Vec<Validator>,
    },
}

fn incompatible_era(error: &ErrorPayload) -> Result<TransactionError, DecodeError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Data {
        incompatible_era: String,
    }
    let Data { incompatible_era } = error_data(error)?;
    Ok(TransactionError::IncompatibleEra { message: error.message.clone(), era: incompatible_era })
}

fn era_mismatch(error: &ErrorPayload) -> Result<TransactionError, DecodeError> {
    let mismatch = error_data(error)?;
    Ok(TransactionError::EraMismatch { message: error.message.clone(), mismatch })
}

fn script_failures(error: &ErrorPayload) -> Result<TransactionError, DecodeError> {
    let failures = error_data(error)?;
    Ok(TransactionError::ScriptFailures { message: error.message.clone(), failures })
}

fn missing_scripts(error: &ErrorPayload) -> Result<TransactionError, DecodeError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Data {
        missing_scripts: Vec<Validator>,
    }
    let Data { missing_scripts } = error_data(error)?;
    Ok(TransactionError::MissingScripts { message: error.message.clone(), scripts: missing_scripts })
}

const SUBMIT_ERRORS: &[ErrorEntry<TransactionError>] =
    &[ErrorEntry { code: SUBMIT_ERA_MISMATCH, decoders: &[era_mismatch] }];

const EVALUATE_ERRORS: &[ErrorEntry<TransactionError>] = &[
    ErrorEntry { code: INCOMPATIBLE_ERA, decoders: &[incompatible_era] },
    ErrorEntry { code: SCRIPT_EXECUTION_FAILURE, decoders: &[script_failures, missing_scripts] },
];

/// `submitTransaction`
pub const SUBMIT_TRANSACTION: MethodDef<SubmitTransactionParams, Submitted, TransactionError> =
    MethodDef::new("submitTransaction", decode_json::<Submitted>, ErrorTable::new(SUBMIT_ERRORS));

/// `evaluateTransaction`
pub const EVALUATE_TRANSACTION: MethodDef<
    EvaluateTransactionParams,
    Vec<Evaluation>,
    TransactionError,
> = MethodDef::new(
    "evaluateTransaction",
    decode_json::<Vec<Evaluation>>,
    ErrorTable::new(EVALUATE_ERRORS),
);

impl Client {
    /// Submits a signed transaction.
    pub async fn submit_transaction(
        &self,
        cbor: impl Into<String>,
    ) -> Result<Submitted, InvokeError<TransactionError>> {
        let params = SubmitTransactionParams { transaction: Cbor { cbor: cbor.into() } };
        self.call(&SUBMIT_TRANSACTION, Some(&params)).await
    }

    /// Computes the execution units of every script in a transaction.
    pub async fn evaluate_transaction(
        &self,
        params: &EvaluateTransactionParams,
    ) -> Result<Vec<Evaluation>, InvokeError<TransactionError>> {
        self.call(&EVALUATE_TRANSACTION, Some(params)).await
    }
}
