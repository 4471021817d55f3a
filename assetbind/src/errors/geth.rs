//! Geth specific revert detection.
//!
//! Geth reports reverts with code 3, an `execution reverted` message and the
//! revert payload as a hex string in the error data.

use super::revert;
use jsonrpc_core::Error as JsonrpcError;

const REVERTED: &str = "execution reverted";
const INVALID_OPCODE: &str = "invalid opcode";

/// Returns the revert payload of a Geth error, or `None` if the error is not
/// a revert.
pub fn revert_payload(err: &JsonrpcError) -> Option<Vec<u8>> {
    if let Some(rest) = err.message.strip_prefix(REVERTED) {
        let data = err
            .data
            .as_ref()
            .and_then(|data| data.as_str())
            .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok());
        Some(match (data, rest.strip_prefix(": ")) {
            (Some(data), _) => data,
            (None, Some(reason)) => revert::encode_reason(reason),
            (None, None) => Vec::new(),
        })
    } else if err.message.starts_with(INVALID_OPCODE) {
        Some(Vec::new())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::*;

    fn rpc_error(message: &str, data: Option<Value>) -> JsonrpcError {
        JsonrpcError {
            code: 3.into(),
            message: message.to_owned(),
            data,
        }
    }

    #[test]
    fn revert_with_payload() {
        let err = rpc_error(
            "execution reverted",
            Some(json!("0x118cdaa70000000000000000000000004242424242424242424242424242424242424242")),
        );
        let payload = revert_payload(&err).unwrap();
        assert_eq!(&payload[..4], &[0x11, 0x8c, 0xda, 0xa7]);
        assert_eq!(payload.len(), 36);
    }

    #[test]
    fn revert_with_reason_only() {
        let err = rpc_error("execution reverted: SafeMath: subtraction overflow", None);
        let payload = revert_payload(&err).unwrap();
        assert_eq!(payload, revert::encode_reason("SafeMath: subtraction overflow"));
    }

    #[test]
    fn revert_without_data() {
        assert_eq!(revert_payload(&rpc_error(REVERTED, None)), Some(Vec::new()));
        assert_eq!(revert_payload(&rpc_error(INVALID_OPCODE, None)), Some(Vec::new()));
        assert_eq!(revert_payload(&rpc_error("nonce too low", None)), None);
    }
}
