//! Expansion of a contract ABI into a module of type-safe bindings.

mod common;
mod errors;
mod events;
mod methods;
mod sessions;
mod structs;
mod types;

use crate::{util, ContractBuilder};
use anyhow::{anyhow, Context as _, Result};
use assetbind_common::Contract;
use inflector::Inflector;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use std::collections::HashMap;
use syn::{Path, Visibility};

/// Internal shared context for generating contract bindings.
pub(crate) struct Context<'a> {
    /// The parsed contract.
    contract: &'a Contract,

    /// The identifier for the runtime crate. Usually this is `assetbind` but
    /// it can be different if the crate was renamed in the Cargo manifest.
    runtime_crate: Ident,

    /// The visibility for the generated module and re-exported contract type.
    visibility: Visibility,

    /// The name of the module in which to place the contract implementation.
    /// The main contract type gets re-exported in the root.
    contract_mod: Ident,

    /// The contract name as an identifier.
    contract_name: Ident,

    /// Manually specified method aliases keyed by canonical signature.
    method_aliases: HashMap<String, Ident>,

    /// Derives added to event structs and enums.
    event_derives: Vec<Path>,

    /// Structs declared by the tuple parameters of the ABI.
    structs: structs::Structs,
}

impl<'a> Context<'a> {
    /// Creates a context from the code generation arguments.
    fn from_builder(contract: &'a Contract, builder: ContractBuilder) -> Result<Self> {
        let raw_contract_name = if let Some(name) = &builder.contract_name_override {
            name
        } else if !contract.name.is_empty() {
            &contract.name
        } else {
            return Err(anyhow!(
                "contract artifact is missing a name, this happens for bare ABI \
                 arrays; in this case the contract name must be specified"
            ));
        };

        let runtime_crate = util::ident(&builder.runtime_crate_name);
        let visibility = match &builder.visibility_modifier {
            Some(vis) => syn::parse_str(vis)?,
            None => Visibility::Inherited,
        };
        let contract_mod = if let Some(name) = &builder.contract_mod_override {
            util::ident(name)
        } else {
            util::ident(&raw_contract_name.to_snake_case())
        };
        let contract_name = util::ident(raw_contract_name);

        let mut method_aliases = HashMap::new();
        for (signature, alias) in builder.method_aliases.into_iter() {
            let alias = syn::parse_str(&alias)
                .with_context(|| format!("invalid alias '{}' for '{}'", alias, signature))?;
            if method_aliases.insert(signature.clone(), alias).is_some() {
                return Err(anyhow!(
                    "duplicate method signature '{}' in method aliases",
                    signature,
                ));
            }
        }

        let event_derives = builder
            .event_derives
            .iter()
            .map(|derive| syn::parse_str::<Path>(derive))
            .collect::<Result<Vec<_>, _>>()
            .context("failed to parse event derives")?;

        let structs = structs::Structs::collect(&contract.abi)?;

        Ok(Context {
            contract,
            runtime_crate,
            visibility,
            contract_mod,
            contract_name,
            method_aliases,
            event_derives,
            structs,
        })
    }
}

pub(crate) fn expand(contract: &Contract, builder: ContractBuilder) -> Result<TokenStream> {
    let cx = Context::from_builder(contract, builder)?;
    let contract = expand_contract(&cx)
        .with_context(|| format!("error expanding contract {} from its ABI", cx.contract_name))?;

    Ok(contract)
}

fn expand_contract(cx: &Context) -> Result<TokenStream> {
    let runtime_crate = &cx.runtime_crate;
    let vis = &cx.visibility;
    let contract_mod = &cx.contract_mod;
    let contract_name = &cx.contract_name;

    let methods = methods::definitions(cx)?;

    let common = common::expand(cx);
    let functions = methods::expand(&methods);
    let sessions = sessions::expand(&methods);
    let events = events::expand(cx)?;
    let errors = errors::expand(cx)?;
    let structs = structs::expand(cx)?;

    Ok(quote! {
        #[allow(dead_code)]
        #vis mod #contract_mod {
            #[rustfmt::skip]
            use #runtime_crate as assetbind;

            #common
            #functions
            #sessions
            #events
            #errors
            #structs
        }
        #vis use self::#contract_mod::Contract as #contract_name;
    })
}
