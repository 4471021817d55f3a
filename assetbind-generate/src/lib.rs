#![deny(missing_docs, unsafe_code)]

//! Crate for generating type-safe bindings to asset contracts. This crate is
//! intended to be used either indirectly with the `assetbind` crate's
//! `contract` procedural macro or directly from a build script.

#[cfg(test)]
#[allow(missing_docs)]
#[macro_use]
#[path = "test/macros.rs"]
mod test_macros;

pub mod source;

mod generate;
mod rustfmt;
mod util;

pub use crate::source::Source;
pub use assetbind_common::artifact::{ArtifactLoader, Contract};

use anyhow::Result;
use proc_macro2::TokenStream;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Options for generating the bindings of one contract. Nothing is generated
/// until [`ContractBuilder::generate`] is called.
pub struct ContractBuilder {
    /// Name under which the generated code refers to the runtime crate.
    pub runtime_crate_name: String,

    /// Visibility of the generated module and of the contract re-export,
    /// private when unset.
    pub visibility_modifier: Option<String>,

    /// Module name to use instead of the snake cased contract name.
    pub contract_mod_override: Option<String>,

    /// Contract name to use instead of the artifact's `contractName`.
    pub contract_name_override: Option<String>,

    /// Rust method names keyed by canonical function signature.
    pub method_aliases: HashMap<String, String>,

    /// Derives added to event structs and enums.
    pub event_derives: Vec<String>,

    /// Whether written bindings are run through `rustfmt`.
    pub rustfmt: bool,
}

impl ContractBuilder {
    /// Creates a builder targeting the `assetbind` runtime with private
    /// bindings and formatting enabled.
    pub fn new() -> Self {
        ContractBuilder {
            runtime_crate_name: "assetbind".to_string(),
            visibility_modifier: None,
            contract_mod_override: None,
            contract_name_override: None,
            method_aliases: Default::default(),
            event_derives: vec![],
            rustfmt: true,
        }
    }

    /// Sets the runtime crate name, for manifests that rename `assetbind`.
    pub fn runtime_crate_name(mut self, name: impl Into<String>) -> Self {
        self.runtime_crate_name = name.into();
        self
    }

    /// Sets the visibility of the generated module, for example `pub(crate)`.
    pub fn visibility_modifier(mut self, vis: impl Into<String>) -> Self {
        self.visibility_modifier = Some(vis.into());
        self
    }

    /// Overrides the name of the generated module.
    pub fn contract_mod_override(mut self, name: impl Into<String>) -> Self {
        self.contract_mod_override = Some(name.into());
        self
    }

    /// Sets the optional contract name override. This setting is needed when
    /// generating from a bare ABI array, which carries no contract name.
    pub fn contract_name_override(mut self, name: impl Into<String>) -> Self {
        self.contract_name_override = Some(name.into());
        self
    }

    /// Binds the function with the given canonical signature, for example
    /// `balanceOf(address,uint256)`, to the Rust method `alias`. Functions
    /// without an alias use their snake cased ABI name.
    pub fn add_method_alias(
        mut self,
        signature: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.method_aliases.insert(signature.into(), alias.into());
        self
    }

    /// Enables or disables `rustfmt` for written bindings. A missing or
    /// failing `rustfmt` leaves the source unformatted.
    pub fn rustfmt(mut self, rustfmt: bool) -> Self {
        self.rustfmt = rustfmt;
        self
    }

    /// Adds a custom derive to the derives for event structs and enums.
    ///
    /// This makes it possible to, for example, derive `serde::Serialize` for
    /// events. Event structs always derive `Clone`, `Debug`, `Eq` and
    /// `PartialEq`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use assetbind_generate::ContractBuilder;
    /// let builder = ContractBuilder::new()
    ///     .add_event_derive("serde::Serialize")
    ///     .add_event_derive("serde::Deserialize");
    /// ```
    pub fn add_event_derive(mut self, derive: impl Into<String>) -> Self {
        self.event_derives.push(derive.into());
        self
    }

    /// Generates the contract bindings.
    ///
    /// Fails for ABIs that cannot be bound, for example when two functions
    /// share a selector or an event indexes too many parameters.
    pub fn generate(self, contract: &Contract) -> Result<ContractBindings> {
        let rustfmt = self.rustfmt;
        Ok(ContractBindings {
            tokens: generate::expand(contract, self)?,
            rustfmt,
        })
    }
}

impl Default for ContractBuilder {
    fn default() -> Self {
        ContractBuilder::new()
    }
}

/// Bindings produced by a [`ContractBuilder`], written to a file by build
/// scripts or turned into tokens by the `contract!` macro.
pub struct ContractBindings {
    /// The generated items.
    pub tokens: TokenStream,

    /// Whether `write` runs the source through `rustfmt`.
    pub rustfmt: bool,
}

impl ContractBindings {
    /// Enables or disables `rustfmt` when writing.
    pub fn rustfmt(mut self, rustfmt: bool) -> Self {
        self.rustfmt = rustfmt;
        self
    }

    /// Writes the bindings as Rust source.
    pub fn write(&self, mut w: impl Write) -> Result<()> {
        let source = {
            let raw = self.tokens.to_string();

            if self.rustfmt {
                rustfmt::format(&raw).unwrap_or_else(|err| {
                    tracing::debug!(%err, "leaving generated code unformatted");
                    raw
                })
            } else {
                raw
            }
        };

        w.write_all(source.as_bytes())?;
        Ok(())
    }

    /// Writes the bindings as Rust source into a new file at `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.write(writer)
    }

    /// Returns the generated items for expansion in a procedural macro.
    pub fn into_tokens(self) -> TokenStream {
        self.tokens
    }
}
