//! Failure Classification
//!
//! Wallets and RPC signers report failures in different shapes: some carry a direct `reason`,
//! some nest it under `error`, some only put it in `info.error.message`, and some only produce a
//! free-text message such as `execution reverted: Already confirmed (action="estimateGas", ...)`.
//! [`classify`] is the single place where those shapes are reduced to an [`ErrorKind`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const REVERT_MARKER: &str = "execution reverted:";
const UNKNOWN_FAILURE: &str = "unknown error";

/// Error code attached to a failure, either symbolic (`"INSUFFICIENT_FUNDS"`) or numeric
/// (`4001`, `-32000`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FailureCode {
    /// Numeric code, as used by JSON-RPC and EIP-1193 providers.
    Numeric(i64),

    /// Symbolic code.
    Text(String),
}

impl FailureCode {
    fn matches(&self, text: &str, numeric: Option<i64>) -> bool {
        match self {
            Self::Text(code) => code.eq_ignore_ascii_case(text),
            Self::Numeric(code) => numeric == Some(*code),
        }
    }
}

impl Display for FailureCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Numeric(code) => Display::fmt(code, f),
            Self::Text(code) => f.write_str(code),
        }
    }
}

/// Nested error object (`error` or `info.error`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedFailure {
    /// Error code.
    pub code: Option<FailureCode>,

    /// Revert reason.
    pub reason: Option<String>,

    /// Free-text message.
    pub message: Option<String>,
}

/// Provider-specific failure details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureInfo {
    /// Underlying provider error.
    pub error: Option<NestedFailure>,
}

/// Opaque failure raised by the execution environment while submitting or awaiting a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Failure {
    /// Error code.
    pub code: Option<FailureCode>,

    /// Direct revert reason.
    pub reason: Option<String>,

    /// Free-text message.
    pub message: Option<String>,

    /// Nested error object.
    pub error: Option<NestedFailure>,

    /// Provider-specific details.
    pub info: Option<FailureInfo>,
}

impl Failure {
    /// Failure carrying only a free-text message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach an error code.
    #[must_use]
    pub fn with_code(mut self, code: FailureCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a direct revert reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The most specific free-text message available.
    pub fn raw_message(&self) -> Option<&str> {
        self.messages().next()
    }

    fn codes(&self) -> impl Iterator<Item = &FailureCode> {
        self.code
            .iter()
            .chain(self.error.iter().filter_map(|error| error.code.as_ref()))
            .chain(self.nested_info().and_then(|error| error.code.as_ref()))
    }

    fn messages(&self) -> impl Iterator<Item = &str> {
        self.nested_info()
            .and_then(|error| error.message.as_deref())
            .into_iter()
            .chain(self.error.iter().filter_map(|error| error.message.as_deref()))
            .chain(self.message.as_deref())
            .filter(|message| !message.trim().is_empty())
    }

    fn nested_info(&self) -> Option<&NestedFailure> {
        self.info.as_ref().and_then(|info| info.error.as_ref())
    }

    fn has_code(&self, text: &str, numeric: Option<i64>) -> bool {
        self.codes().any(|code| code.matches(text, numeric))
    }

    fn mentions(&self, needles: &[&str]) -> bool {
        self.messages().any(|message| {
            let message = message.to_ascii_lowercase();

            needles.iter().any(|needle| message.contains(needle))
        })
    }
}

/// Classified failure of a submitted or pending call.
#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The signer declined the request.
    #[error("transaction was cancelled by user")]
    UserRejected,

    /// The account cannot cover value plus gas.
    #[error("insufficient funds; top the account up with test ether")]
    InsufficientFunds,

    /// The node could not estimate gas for the call.
    #[error("gas estimation failed; try increasing the gas limit")]
    GasEstimationFailed,

    /// The contract reverted with a reason.
    #[error("contract reverted: {0}")]
    ContractReverted(String),

    /// Nothing more specific matched.
    #[error("{0}")]
    UnknownFailure(String),
}

/// Reduce a failure to exactly one [`ErrorKind`].
///
/// Checks, in order: user rejection, insufficient funds, an extractable revert reason, gas
/// estimation, and finally falls back to the raw message. Revert reasons win over gas
/// estimation because revert messages raised during estimation also mention gas.
pub fn classify(failure: &Failure) -> ErrorKind {
    if failure.has_code("ACTION_REJECTED", Some(4001))
        || failure.mentions(&["user rejected", "user denied"])
    {
        return ErrorKind::UserRejected;
    }

    if failure.has_code("INSUFFICIENT_FUNDS", None) || failure.mentions(&["insufficient funds"]) {
        return ErrorKind::InsufficientFunds;
    }

    if let Some(reason) = revert_reason(failure) {
        return ErrorKind::ContractReverted(reason);
    }

    if failure.mentions(&[
        "estimate gas",
        "estimategas",
        "gas estimation",
        "gas required exceeds",
    ]) {
        return ErrorKind::GasEstimationFailed;
    }

    ErrorKind::UnknownFailure(
        failure
            .raw_message()
            .unwrap_or(UNKNOWN_FAILURE)
            .to_string(),
    )
}

/// Extract a revert reason from the first matching source: the direct `reason`, the nested
/// `error.reason`, then the text after `execution reverted:` in any message.
pub fn revert_reason(failure: &Failure) -> Option<String> {
    let direct = failure.reason.as_deref();
    let nested = failure.error.as_ref().and_then(|error| error.reason.as_deref());

    direct
        .into_iter()
        .chain(nested)
        .map(str::trim)
        .find(|reason| !reason.is_empty())
        .map(str::to_string)
        .or_else(|| failure.messages().find_map(reason_from_message))
}

/// Text following `execution reverted:` up to the next comma, opening parenthesis or the end.
fn reason_from_message(message: &str) -> Option<String> {
    let (_, rest) = message.split_once(REVERT_MARKER)?;
    let reason = rest.split([',', '(']).next()?.trim();

    (!reason.is_empty()).then(|| reason.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn revert_reason_from_plain_message() {
        let failure = Failure::from_message("execution reverted: Equipment not found");

        assert_eq!(
            classify(&failure),
            ErrorKind::ContractReverted("Equipment not found".to_string())
        );
    }

    #[test]
    fn revert_reason_stops_at_parenthesis_and_comma() {
        let with_details = Failure::from_message(
            r#"execution reverted: Already confirmed (action="estimateGas", data="0x08c3")"#,
        );
        let with_comma = Failure::from_message("execution reverted: Booking not found, code=3");

        assert_eq!(
            classify(&with_details),
            ErrorKind::ContractReverted("Already confirmed".to_string())
        );
        assert_eq!(
            classify(&with_comma),
            ErrorKind::ContractReverted("Booking not found".to_string())
        );
    }

    #[test]
    fn direct_reason_wins_over_nested_and_message() {
        let failure = Failure {
            reason: Some("Direct".to_string()),
            message: Some("execution reverted: From message".to_string()),
            error: Some(NestedFailure {
                reason: Some("Nested".to_string()),
                ..NestedFailure::default()
            }),
            ..Failure::default()
        };

        assert_eq!(revert_reason(&failure).as_deref(), Some("Direct"));
    }

    #[test]
    fn nested_reason_wins_over_message() {
        let failure = Failure {
            message: Some("execution reverted: From message".to_string()),
            error: Some(NestedFailure {
                reason: Some("Nested".to_string()),
                ..NestedFailure::default()
            }),
            ..Failure::default()
        };

        assert_eq!(revert_reason(&failure).as_deref(), Some("Nested"));
    }

    #[test]
    fn reason_found_in_info_error_message() -> TestResult {
        let failure: Failure = serde_json::from_value(json!({
            "code": "CALL_EXCEPTION",
            "message": "transaction failed",
            "info": { "error": { "code": 3, "message": "execution reverted: Not the owner" } }
        }))?;

        assert_eq!(
            classify(&failure),
            ErrorKind::ContractReverted("Not the owner".to_string())
        );

        Ok(())
    }

    #[test]
    fn user_rejection_by_code_or_message() {
        let by_code = Failure::from_message("whatever")
            .with_code(FailureCode::Text("ACTION_REJECTED".to_string()));
        let by_numeric = Failure::from_message("request failed").with_code(FailureCode::Numeric(4001));
        let by_message = Failure::from_message("MetaMask Tx Signature: User denied transaction signature.");

        assert_eq!(classify(&by_code), ErrorKind::UserRejected);
        assert_eq!(classify(&by_numeric), ErrorKind::UserRejected);
        assert_eq!(classify(&by_message), ErrorKind::UserRejected);
    }

    #[test]
    fn insufficient_funds_by_code_or_message() {
        let by_code = Failure::from_message("cannot send")
            .with_code(FailureCode::Text("INSUFFICIENT_FUNDS".to_string()));
        let by_message = Failure::from_message("insufficient funds for gas * price + value");

        assert_eq!(classify(&by_code), ErrorKind::InsufficientFunds);
        assert_eq!(classify(&by_message), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn gas_estimation_without_reason() {
        let failure = Failure::from_message("cannot estimate gas; transaction may fail");

        assert_eq!(classify(&failure), ErrorKind::GasEstimationFailed);
    }

    #[test]
    fn unknown_failure_keeps_raw_message() {
        let failure = Failure::from_message("nonce too low");

        assert_eq!(
            classify(&failure),
            ErrorKind::UnknownFailure("nonce too low".to_string())
        );
    }

    #[test]
    fn empty_failure_is_still_classified() {
        assert_eq!(
            classify(&Failure::default()),
            ErrorKind::UnknownFailure("unknown error".to_string())
        );
    }

    #[test]
    fn empty_reason_is_ignored() {
        let failure = Failure::from_message("execution reverted: ").with_reason("  ");

        assert_eq!(
            classify(&failure),
            ErrorKind::UnknownFailure("execution reverted: ".to_string())
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let failure = Failure::from_message("execution reverted: Already confirmed");

        assert_eq!(classify(&failure), classify(&failure.clone()));
    }
}
