//! The JSON representation of contract ABIs emitted by Solidity compilers.
//!
//! Parsing is forgiving: unknown fields are ignored, a missing entry `type`
//! means `function` and the legacy `constant` and `payable` flags are honoured
//! when `stateMutability` is absent.

use crate::abi::{AbiError, Constructor, Event, EventParam, Function, Param, ParamType, StateMutability};
use crate::errors::{ParseError, ParseParamTypeError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct JsonEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<JsonParam>,
    #[serde(default)]
    outputs: Vec<JsonParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct JsonParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "internalType", default)]
    internal_type: Option<String>,
    #[serde(default)]
    components: Vec<JsonParam>,
    #[serde(default)]
    indexed: bool,
}

fn default_entry_type() -> String {
    "function".to_owned()
}

/// A parsed ABI entry.
pub(crate) enum Entry {
    Function(Function),
    Event(Event),
    Error(AbiError),
    Constructor(Constructor),
    Receive,
    Fallback,
}

impl JsonEntry {
    pub(crate) fn into_entry(self) -> Result<Entry, ParseError> {
        let entry_name = if self.name.is_empty() {
            self.kind.clone()
        } else {
            self.name.clone()
        };
        let params = |params: Vec<JsonParam>| {
            params
                .into_iter()
                .map(|param| param.into_param(&entry_name))
                .collect::<Result<Vec<_>, _>>()
        };

        let entry = match self.kind.as_str() {
            "function" => Entry::Function(Function {
                state_mutability: self.mutability(),
                name: self.name,
                inputs: params(self.inputs)?,
                outputs: params(self.outputs)?,
            }),
            "event" => Entry::Event(Event {
                name: self.name,
                inputs: self
                    .inputs
                    .into_iter()
                    .map(|param| {
                        let indexed = param.indexed;
                        Ok(EventParam {
                            param: param.into_param(&entry_name)?,
                            indexed,
                        })
                    })
                    .collect::<Result<Vec<_>, ParseError>>()?,
                anonymous: self.anonymous,
            }),
            "error" => Entry::Error(AbiError {
                name: self.name,
                inputs: params(self.inputs)?,
            }),
            "constructor" => Entry::Constructor(Constructor {
                inputs: params(self.inputs)?,
            }),
            "receive" => Entry::Receive,
            "fallback" => Entry::Fallback,
            other => return Err(ParseError::UnknownEntry(other.to_owned())),
        };
        Ok(entry)
    }

    fn mutability(&self) -> StateMutability {
        match (self.state_mutability, self.constant, self.payable) {
            (Some(mutability), _, _) => mutability,
            (None, Some(true), _) => StateMutability::View,
            (None, _, Some(true)) => StateMutability::Payable,
            _ => StateMutability::NonPayable,
        }
    }
}

impl JsonParam {
    fn into_param(self, entry: &str) -> Result<Param, ParseError> {
        let components = self
            .components
            .into_iter()
            .map(|component| component.into_param(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let kind = resolve_kind(&self.kind, &components).map_err(|source| ParseError::ParamType {
            entry: entry.to_owned(),
            param: self.name.clone(),
            source,
        })?;

        Ok(Param {
            name: self.name,
            kind,
            internal_type: self.internal_type,
            components,
        })
    }
}

/// Resolves a JSON type, substituting `tuple` with the component types.
fn resolve_kind(kind: &str, components: &[Param]) -> Result<ParamType, ParseParamTypeError> {
    let suffix = match kind.strip_prefix("tuple") {
        Some(suffix) => suffix,
        None => return kind.parse(),
    };

    let mut resolved = ParamType::Tuple(components.iter().map(|param| param.kind.clone()).collect());
    let mut rest = suffix;
    while !rest.is_empty() {
        let close = rest
            .strip_prefix('[')
            .and_then(|dims| dims.find(']'))
            .ok_or_else(|| ParseParamTypeError(kind.to_owned()))?;
        let dimension = &rest[1..close + 1];
        resolved = if dimension.is_empty() {
            ParamType::Array(Box::new(resolved))
        } else {
            let len = dimension
                .parse()
                .map_err(|_| ParseParamTypeError(kind.to_owned()))?;
            ParamType::FixedArray(Box::new(resolved), len)
        };
        rest = &rest[close + 2..];
    }
    Ok(resolved)
}
