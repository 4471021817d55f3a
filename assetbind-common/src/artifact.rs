//! Loading of contract artifacts.
//!
//! An artifact is a JSON document describing a single contract. Two shapes
//! are accepted:
//!
//! - an object with an optional `contractName` and an `abi` field, as
//!   produced by Truffle, Hardhat, Foundry and most other tools;
//! - a bare ABI array, as produced by `solc --abi`, in which case the
//!   contract name has to come from the loader.

use crate::errors::ArtifactError;
use crate::Abi;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A contract interface together with its name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contract {
    /// The contract name. Unnamed contracts have an empty string as their
    /// name.
    pub name: String,
    /// The contract ABI.
    pub abi: Arc<Abi>,
    /// The ABI as minified JSON text, suitable for embedding in generated
    /// code.
    pub abi_json: String,
}

impl Contract {
    /// Parses a contract from artifact JSON text.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        ArtifactLoader::new().load_contract_from_str(json)
    }
}

/// Loads contract artifacts.
#[derive(Clone, Debug, Default)]
pub struct ArtifactLoader {
    /// Override for the contract's name.
    ///
    /// Bare ABI arrays carry no name, and named artifacts can be renamed.
    pub name: Option<String>,
}

impl ArtifactLoader {
    /// Creates a new artifact loader.
    pub fn new() -> Self {
        ArtifactLoader::default()
    }

    /// Sets an override for the contract's name. See [`name`] for more info.
    ///
    /// [`name`]: #structfield.name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Loads a contract from a string of JSON text.
    pub fn load_contract_from_str(&self, json: &str) -> Result<Contract, ArtifactError> {
        let value = serde_json::from_str(json)?;
        self.load_contract_from_value(value)
    }

    /// Loads a contract from bytes of JSON text.
    pub fn load_contract_from_slice(&self, json: &[u8]) -> Result<Contract, ArtifactError> {
        let value = serde_json::from_slice(json)?;
        self.load_contract_from_value(value)
    }

    /// Loads a contract from a parsed JSON value.
    pub fn load_contract_from_value(&self, value: Value) -> Result<Contract, ArtifactError> {
        let (name, abi) = match value {
            Value::Object(mut object) => {
                let name = object
                    .remove("contractName")
                    .and_then(|name| name.as_str().map(str::to_owned))
                    .unwrap_or_default();
                let abi = object.remove("abi").unwrap_or(Value::Array(Vec::new()));
                (name, abi)
            }
            abi => (String::new(), abi),
        };

        let abi_json = serde_json::to_string(&abi)?;
        let abi = Abi::from_value(abi)?;
        Ok(Contract {
            name: self.name.clone().unwrap_or(name),
            abi: Arc::new(abi),
            abi_json,
        })
    }

    /// Loads a contract from disk.
    pub fn load_contract_from_file(&self, path: impl AsRef<Path>) -> Result<Contract, ArtifactError> {
        let json = fs::read_to_string(path)?;
        self.load_contract_from_str(&json)
    }
}
