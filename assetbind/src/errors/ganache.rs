//! Ganache specific revert detection.

use super::revert;
use assetbind_common::H256;
use jsonrpc_core::Error as JsonrpcError;

/// Returns the revert payload of a Ganache error, or `None` if the error is
/// not a revert.
pub fn revert_payload(err: &JsonrpcError) -> Option<Vec<u8>> {
    match error_param(err, "error") {
        Some("revert") => {
            let data = error_param(err, "return")
                .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok())
                .filter(|data| !data.is_empty());
            Some(match (data, error_param(err, "reason")) {
                (Some(data), _) => data,
                (None, Some(reason)) => revert::encode_reason(reason),
                (None, None) => Vec::new(),
            })
        }
        Some("invalid opcode") => Some(Vec::new()),
        _ => None,
    }
}

/// Gets a parameter of the single transaction object, keyed by a transaction
/// hash, inside the error data.
fn error_param<'a>(err: &'a JsonrpcError, name: &str) -> Option<&'a str> {
    fn is_hash_str(s: &str) -> bool {
        s.len() == 66 && s[2..].parse::<H256>().is_ok()
    }

    err.data
        .as_ref()?
        .as_object()?
        .iter()
        .find_map(|(k, v)| if is_hash_str(k) { Some(v) } else { None })?
        .get(name)?
        .as_str()
}
