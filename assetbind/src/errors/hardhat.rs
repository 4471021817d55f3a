//! Hardhat specific revert detection.
//!
//! Error messages can be found here:
//! <https://github.com/NomicFoundation/hardhat/blob/d3278835257841dd62d619c00f53f908ffb5f743/packages/hardhat-core/src/internal/hardhat-network/stack-traces/solidity-errors.ts#L217>

use super::revert;
use jsonrpc_core::Error as JsonrpcError;

const REASON_PREFIX: &str = "VM Exception while processing transaction: reverted with reason string '";

/// Returns the revert payload of a Hardhat error, or `None` if the error is
/// not a revert.
pub fn revert_payload(err: &JsonrpcError) -> Option<Vec<u8>> {
    if !["VM Exception", "Transaction reverted"]
        .iter()
        .any(|needle| err.message.contains(needle))
    {
        return None;
    }

    let data = err
        .data
        .as_ref()
        .and_then(|data| data.get("data"))
        .and_then(|data| data.as_str())
        .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok());
    if let Some(data) = data {
        return Some(data);
    }

    let reason = err
        .message
        .find(REASON_PREFIX)
        .map(|start| &err.message[start + REASON_PREFIX.len()..])
        .and_then(|rest| rest.strip_suffix('\''));
    Some(match reason {
        Some(reason) => revert::encode_reason(reason),
        None => Vec::new(),
    })
}
