//! Function, event and error parameters.

use crate::abi::ParamType;
use serde::{Deserialize, Serialize};

/// A function or error parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    /// The parameter name, empty for unnamed parameters.
    pub name: String,
    /// The parameter type.
    pub kind: ParamType,
    /// The Solidity source level type, for example
    /// `struct EquityContractV3.Equity`.
    pub internal_type: Option<String>,
    /// The named components of a tuple type, or of the tuple element type of
    /// an array.
    pub components: Vec<Param>,
}

impl Param {
    /// Creates an unnamed parameter of the given type.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Param {
            name: name.into(),
            kind,
            internal_type: None,
            components: Vec::new(),
        }
    }

    /// Returns the fully qualified struct name declared in the internal type
    /// of a tuple parameter with array suffixes removed, for example
    /// `AlternateAssetsV1.AlternateAsset`. Some compilers omit the space
    /// after the `struct` keyword.
    pub fn struct_path(&self) -> Option<&str> {
        let internal_type = self.internal_type.as_deref()?;
        let path = internal_type.strip_prefix("struct")?.trim_start();
        let end = path.find('[').unwrap_or(path.len());
        Some(&path[..end])
    }

    /// Returns the unqualified struct name declared in the internal type of a
    /// tuple parameter.
    pub fn struct_name(&self) -> Option<&str> {
        let path = self.struct_path()?;
        Some(path.rsplit('.').next().unwrap_or(path))
    }

    /// Returns the tuple type underneath any array dimensions of this
    /// parameter.
    pub fn tuple_type(&self) -> Option<&ParamType> {
        let mut kind = &self.kind;
        loop {
            match kind {
                ParamType::Array(inner) | ParamType::FixedArray(inner, _) => kind = inner,
                ParamType::Tuple(_) => return Some(kind),
                _ => return None,
            }
        }
    }
}

/// An event parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventParam {
    /// The parameter itself.
    pub param: Param,
    /// Whether the parameter is stored in a log topic instead of the log
    /// data.
    pub indexed: bool,
}

impl EventParam {
    /// Creates an event parameter.
    pub fn new(name: impl Into<String>, kind: ParamType, indexed: bool) -> Self {
        EventParam {
            param: Param::new(name, kind),
            indexed,
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.param.name
    }

    /// The parameter type.
    pub fn kind(&self) -> &ParamType {
        &self.param.kind
    }
}

/// Whether a function reads or modifies contract state and whether it accepts
/// value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Does not read state.
    Pure,
    /// Reads but does not modify state.
    View,
    /// Modifies state and rejects value.
    NonPayable,
    /// Modifies state and accepts value.
    Payable,
}

impl StateMutability {
    /// Returns `true` for functions that can be evaluated with a read-only
    /// call.
    pub fn is_constant(self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}
