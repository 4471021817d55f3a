//! Keccak256 hash utilities.

use crate::{Address, H256};
use tiny_keccak::{Hasher, Keccak};

/// A 4-byte function or error selector.
pub type H32 = [u8; 4];

/// Perform a Keccak256 hash of data and return its 32-byte result.
pub fn keccak256<B>(data: B) -> [u8; 32]
where
    B: AsRef<[u8]>,
{
    let mut output = [0u8; 32];
    let mut hasher = Keccak::v256();
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// Calculate the function selector from a Solidity function signature. This
/// is defined as the first 4 bytes of the Keccak256 hash of the function
/// signature.
pub fn function_selector<S>(signature: S) -> H32
where
    S: AsRef<str>,
{
    let hash = keccak256(signature.as_ref());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[0..4]);
    selector
}

/// Calculate the topic 0 of a non-anonymous event with the given signature.
pub fn event_topic<S>(signature: S) -> H256
where
    S: AsRef<str>,
{
    H256(keccak256(signature.as_ref()))
}

/// Formats an address as a mixed-case checksummed hex string (EIP-55).
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}
