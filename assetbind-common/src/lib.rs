#![deny(missing_docs, unsafe_code)]

//! Crate for common types shared between the `assetbind` runtime crate and the
//! `assetbind-generate` code generator: the ABI model, the head-tail codec,
//! hashing helpers and contract artifact loading.

pub mod abi;
pub mod artifact;
pub mod errors;
pub mod hash;

pub use crate::abi::Abi;
pub use crate::artifact::{ArtifactLoader, Contract};
pub use crate::hash::H32;
pub use primitive_types::{H160, H256, U256};

/// An Ethereum account address.
pub type Address = H160;

/// A transaction hash.
pub type TransactionHash = H256;
