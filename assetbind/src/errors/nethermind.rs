//! Nethermind specific revert detection.
//!
//! Nethermind puts `Reverted 0x<payload>` in the error data.

use jsonrpc_core::Error as JsonrpcError;

/// Revert error discriminant.
const REVERTED: &str = "Reverted 0x";
/// Invalid op-code error discriminant.
const INVALID: &str = "Bad instruction";
/// Error messages for VM execution errors.
const MESSAGES: &[&str] = &["VM execution error", "VM execution error."];

/// Returns the revert payload of a Nethermind error, or `None` if the error
/// is not a revert.
pub fn revert_payload(err: &JsonrpcError) -> Option<Vec<u8>> {
    let message = err.data.as_ref().and_then(|data| data.as_str());
    if let Some(payload) = message.and_then(|message| message.strip_prefix(REVERTED)) {
        return Some(hex::decode(payload).unwrap_or_default());
    }
    if message.map_or(false, |message| message.starts_with(INVALID))
        || MESSAGES.contains(&err.message.as_str())
    {
        return Some(Vec::new());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::revert;
    use crate::test::prelude::*;
    use jsonrpc_core::ErrorCode;

    fn rpc_error(data: &str) -> JsonrpcError {
        JsonrpcError {
            code: ErrorCode::from(-32015),
            message: "VM execution error".to_owned(),
            data: Some(json!(data)),
        }
    }

    #[test]
    fn revert_with_payload() {
        let payload = revert::encode_reason("message");
        let err = rpc_error(&format!("Reverted 0x{}", hex::encode(&payload)));
        assert_eq!(revert_payload(&err), Some(payload));
    }

    #[test]
    fn revert_without_payload() {
        assert_eq!(revert_payload(&rpc_error("Reverted 0x")), Some(Vec::new()));
        assert_eq!(revert_payload(&rpc_error("Bad instruction fd")), Some(Vec::new()));
        assert_eq!(revert_payload(&rpc_error("revert")), Some(Vec::new()));
    }

    #[test]
    fn unrelated_error() {
        let err = JsonrpcError {
            code: ErrorCode::from(-32000),
            message: "header not found".to_owned(),
            data: None,
        };
        assert_eq!(revert_payload(&err), None);
    }
}
