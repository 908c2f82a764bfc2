//! Conversions from RPC errors into the collaborator error types.

use serde_json::Value;

use sciquip::{
    failures::{Failure, FailureCode},
    operations::ReadError,
};

use crate::gateway::ConnectionError;

use super::{
    abi::{AbiError, decode_revert},
    client::{RpcError, RpcErrorObject},
};

impl From<RpcError> for Failure {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Node(object) => failure_from_node(&object),
            RpcError::Http(error) => Failure::from_message(error.to_string()),
            RpcError::UnexpectedResponse(message) => Failure::from_message(message),
        }
    }
}

fn failure_from_node(object: &RpcErrorObject) -> Failure {
    let failure =
        Failure::from_message(object.message.clone()).with_code(FailureCode::Numeric(object.code));

    match object.data.as_ref().and_then(revert_data) {
        Some(reason) => failure.with_reason(reason),
        None => failure,
    }
}

/// Revert reason from the error's `data`, either a hex string or an object wrapping one.
fn revert_data(data: &Value) -> Option<String> {
    let hex_data = match data {
        Value::String(hex_data) => hex_data.as_str(),
        Value::Object(fields) => fields.get("data")?.as_str()?,
        _ => return None,
    };

    let bytes = hex::decode(hex_data.strip_prefix("0x").unwrap_or(hex_data)).ok()?;

    decode_revert(&bytes)
}

impl From<RpcError> for ReadError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Http(_) | RpcError::Node(_) => Self::Unavailable(error.to_string()),
            RpcError::UnexpectedResponse(message) => Self::Malformed(message),
        }
    }
}

impl From<AbiError> for ReadError {
    fn from(error: AbiError) -> Self {
        Self::Malformed(error.to_string())
    }
}

impl From<RpcError> for ConnectionError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::Http(error) => Self::Unreachable(error.to_string()),
            RpcError::Node(_) | RpcError::UnexpectedResponse(_) => {
                Self::UnexpectedResponse(error.to_string())
            }
        }
    }
}
