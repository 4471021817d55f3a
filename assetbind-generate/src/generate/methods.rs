use crate::generate::{structs, types, Context};
use crate::util;
use anyhow::{anyhow, Context as _, Result};
use assetbind_common::abi::{Function, Param, StateMutability};
use inflector::Inflector;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use std::collections::HashMap;

/// Method names taken by the generated contract handle and its facets.
const RESERVED: &[&str] = &[
    "abi",
    "address",
    "as_caller",
    "as_filterer",
    "as_transactor",
    "at",
    "caller_at",
    "defaults",
    "defaults_mut",
    "events",
    "filterer_at",
    "raw_contract",
    "raw_instance",
    "raw_transfer",
    "session",
    "transactor_at",
    "with_instance",
];

/// A contract function prepared for expansion into the facets and sessions.
pub(crate) struct Method {
    pub name: Ident,
    pub doc: TokenStream,
    /// The typed parameter list, `account: Address, id: U256`.
    pub inputs: TokenStream,
    /// The bare argument list, `account, id`.
    pub arguments: TokenStream,
    /// The arguments as a tuple, `(account, id,)`.
    tuple: TokenStream,
    pub output: TokenStream,
    pub view: bool,
    selector: TokenStream,
    output_struct: Option<TokenStream>,
}

/// Prepares every function of the ABI, failing when two functions would bind
/// to the same Rust method.
pub(crate) fn definitions(cx: &Context) -> Result<Vec<Method>> {
    let mut names = HashMap::new();
    let mut methods = Vec::new();
    for function in cx.contract.abi.functions() {
        let signature = function.signature();
        let name = match cx.method_aliases.get(&signature) {
            Some(alias) => alias.clone(),
            None => util::snake_ident(&function.name, 0),
        };

        if RESERVED.contains(&name.to_string().as_str()) {
            return Err(anyhow!(
                "function {} collides with the generated method `{}`, add a method alias",
                signature,
                name,
            ));
        }
        if let Some(previous) = names.insert(name.to_string(), signature.clone()) {
            return Err(anyhow!(
                "functions {} and {} both bind to the method `{}`, add a method alias",
                previous,
                signature,
                name,
            ));
        }

        let method = expand_definition(cx, function, name)
            .with_context(|| format!("error expanding function {}", signature))?;
        methods.push(method);
    }
    Ok(methods)
}

fn expand_definition(cx: &Context, function: &Function, name: Ident) -> Result<Method> {
    let view = function.is_constant();
    let selector = util::expand_bytes(&function.selector());
    let doc = expand_doc(function);

    let names = util::param_names(function.inputs.iter().map(|input| input.name.as_str()));
    let input_types = function
        .inputs
        .iter()
        .map(|input| types::expand_param(cx, input))
        .collect::<Result<Vec<_>>>()?;
    let inputs = quote! { #( #names: #input_types ),* };
    let arguments = quote! { #( #names ),* };
    let tuple = quote! { (#( #names, )*) };

    let (output, output_struct) = expand_output(cx, &name, &function.outputs)?;

    Ok(Method {
        name,
        doc,
        inputs,
        arguments,
        tuple,
        output,
        view,
        selector,
        output_struct,
    })
}

fn expand_output(
    cx: &Context,
    name: &Ident,
    outputs: &[Param],
) -> Result<(TokenStream, Option<TokenStream>)> {
    match outputs {
        [] => Ok((quote! { () }, None)),
        [output] => Ok((types::expand_param(cx, output)?, None)),
        _ if outputs.iter().all(|output| !output.name.is_empty()) => {
            let ident = util::ident(&format!("{}Output", name.to_string().to_pascal_case()));
            let doc = util::expand_doc(&format!("The outputs of [`Contract::{}`].", name));
            let output_struct = structs::expand_struct(cx, &ident, doc, outputs)?;
            Ok((quote! { #ident }, Some(output_struct)))
        }
        _ => {
            let types = outputs
                .iter()
                .map(|output| types::expand_param(cx, output))
                .collect::<Result<Vec<_>>>()?;
            Ok((quote! { (#( #types, )*) }, None))
        }
    }
}

fn expand_doc(function: &Function) -> TokenStream {
    let kind = if function.is_constant() {
        "Free data retrieval call"
    } else {
        "Paid mutator transaction"
    };
    let summary = util::expand_doc(&format!(
        "{} binding the contract method `0x{}`.",
        kind,
        hex(&function.selector()),
    ));
    let solidity = util::expand_doc(&format!("Solidity: `{}`", solidity_signature(function)));

    quote! {
        #summary
        #[doc = ""]
        #solidity
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// The function declaration as it reads in Solidity source.
fn solidity_signature(function: &Function) -> String {
    let params = |params: &[Param]| {
        params
            .iter()
            .map(|param| {
                let kind = types::solidity_type(param);
                if param.name.is_empty() {
                    kind
                } else {
                    format!("{} {}", kind, param.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mutability = match function.state_mutability {
        StateMutability::Pure => " pure",
        StateMutability::View => " view",
        StateMutability::Payable => " payable",
        StateMutability::NonPayable => "",
    };
    format!(
        "function {}({}){} returns({})",
        function.name,
        params(&function.inputs),
        mutability,
        params(&function.outputs),
    )
}

/// Expands the function methods of the contract handle, the caller facet
/// and the transactor facet.
pub(crate) fn expand(methods: &[Method]) -> TokenStream {
    let all = methods.iter().map(expand_method);
    let views = methods
        .iter()
        .filter(|method| method.view)
        .map(expand_method);
    let mutators = methods
        .iter()
        .filter(|method| !method.view)
        .map(expand_method);
    let output_structs = methods.iter().filter_map(|method| method.output_struct.as_ref());

    quote! {
        impl Contract {
            #( #all )*
        }

        impl Caller {
            #( #views )*
        }

        impl Transactor {
            #( #mutators )*
        }

        #( #output_structs )*
    }
}

fn expand_method(method: &Method) -> TokenStream {
    let Method {
        name,
        doc,
        inputs,
        tuple,
        output,
        selector,
        ..
    } = method;

    if method.view {
        quote! {
            #doc
            pub fn #name(&self, #inputs) -> assetbind::dyns::DynViewMethodBuilder<#output> {
                self.instance
                    .view_method(#selector, #tuple)
                    .expect("generated call")
            }
        }
    } else {
        quote! {
            #doc
            pub fn #name(&self, #inputs) -> assetbind::dyns::DynMethodBuilder<#output> {
                self.instance
                    .method(#selector, #tuple)
                    .expect("generated call")
            }
        }
    }
}
