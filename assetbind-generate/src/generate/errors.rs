use crate::generate::{types, Context};
use crate::util;
use anyhow::{Context as _, Result};
use assetbind_common::abi::AbiError;
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Expands the `errors` module with one struct per custom error and the
/// `ContractError` enum resolving reverts by selector.
pub(crate) fn expand(cx: &Context) -> Result<TokenStream> {
    let errors = cx.contract.abi.errors();
    let structs = errors
        .iter()
        .enumerate()
        .map(|(index, error)| {
            expand_error(cx, index, error)
                .with_context(|| format!("error expanding error {}", error.signature()))
        })
        .collect::<Result<Vec<_>>>()?;
    let variants = errors
        .iter()
        .map(|error| util::type_ident(&error.name))
        .collect::<Vec<_>>();

    Ok(quote! {
        /// Module containing the custom errors of the contract.
        pub mod errors {
            #[allow(unused_imports)]
            use super::*;

            #( #structs )*

            /// A custom error of the contract.
            #[derive(Clone, Debug, Eq, PartialEq)]
            pub enum ContractError {
                #( #variants(#variants), )*
            }

            impl ContractError {
                /// Resolves revert data into a custom error of the contract, a
                /// built-in error or panic, or leaves it unknown.
                pub fn resolve(
                    revert: &assetbind::errors::Revert,
                ) -> assetbind::errors::RevertReason<Self> {
                    revert.decode()
                }
            }

            impl assetbind::errors::ContractRevert for ContractError {
                #[allow(unused_variables)]
                fn decode_revert(revert: &assetbind::errors::Revert) -> Option<Self> {
                    let selector = revert.selector()?;
                    #(
                        if selector == #variants::selector() {
                            return <#variants as assetbind::errors::ContractRevert>::decode_revert(revert)
                                .map(ContractError::#variants);
                        }
                    )*
                    None
                }
            }
        }
    })
}

fn expand_error(cx: &Context, index: usize, error: &AbiError) -> Result<TokenStream> {
    let name = util::type_ident(&error.name);
    let doc = util::expand_doc(&format!("Solidity: `{}`", solidity_declaration(error)));

    let fields = util::param_names(error.inputs.iter().map(|input| input.name.as_str()));
    let types = error
        .inputs
        .iter()
        .map(|input| types::expand_param(cx, input))
        .collect::<Result<Vec<_>>>()?;
    let count = Literal::usize_unsuffixed(fields.len());
    let index = Literal::usize_unsuffixed(index);
    let selector = util::expand_bytes(&error.selector());
    let signature = Literal::string(&error.signature());

    Ok(quote! {
        #doc
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub struct #name {
            #( pub #fields: #types, )*
        }

        impl #name {
            /// The 4-byte selector prefixing the revert data of this error.
            pub fn selector() -> assetbind::common::H32 {
                #selector
            }

            /// The canonical ABI signature of the error.
            pub fn abi_signature() -> &'static str {
                #signature
            }
        }

        impl assetbind::errors::ContractRevert for #name {
            fn decode_revert(revert: &assetbind::errors::Revert) -> Option<Self> {
                if revert.selector()? != Self::selector() {
                    return None;
                }
                let abi = super::abi();
                let tokens = abi.errors().get(#index)?.decode(revert.arguments()).ok()?;
                let [#( #fields ),*] = assetbind::tokens::into_tuple::<#count>(
                    assetbind::common::abi::Token::Tuple(tokens),
                )
                .ok()?;
                Some(#name {
                    #( #fields: assetbind::tokens::Tokenize::from_token(#fields).ok()?, )*
                })
            }
        }
    })
}

fn solidity_declaration(error: &AbiError) -> String {
    let inputs = error
        .inputs
        .iter()
        .map(|input| {
            let kind = types::solidity_type(input);
            if input.name.is_empty() {
                kind
            } else {
                format!("{} {}", kind, input.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("error {}({})", error.name, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::context;

    const ABI: &str = r#"[{
        "type": "error",
        "name": "OwnableUnauthorizedAccount",
        "inputs": [{ "name": "account", "type": "address", "internalType": "address" }]
    }]"#;

    #[test]
    fn expand_error_struct() {
        let cx = context(ABI);
        let error = &cx.contract.abi.errors()[0];
        assert_quote!(expand_error(&cx, 0, error).unwrap(), {
            #[doc = "Solidity: `error OwnableUnauthorizedAccount(address account)`"]
            #[derive(Clone, Debug, Eq, PartialEq)]
            pub struct OwnableUnauthorizedAccount {
                pub account: assetbind::Address,
            }

            impl OwnableUnauthorizedAccount {
                /// The 4-byte selector prefixing the revert data of this error.
                pub fn selector() -> assetbind::common::H32 {
                    [17u8, 140u8, 218u8, 167u8]
                }

                /// The canonical ABI signature of the error.
                pub fn abi_signature() -> &'static str {
                    "OwnableUnauthorizedAccount(address)"
                }
            }

            impl assetbind::errors::ContractRevert for OwnableUnauthorizedAccount {
                fn decode_revert(revert: &assetbind::errors::Revert) -> Option<Self> {
                    if revert.selector()? != Self::selector() {
                        return None;
                    }
                    let abi = super::abi();
                    let tokens = abi.errors().get(0)?.decode(revert.arguments()).ok()?;
                    let [account] = assetbind::tokens::into_tuple::<1>(
                        assetbind::common::abi::Token::Tuple(tokens),
                    )
                    .ok()?;
                    Some(OwnableUnauthorizedAccount {
                        account: assetbind::tokens::Tokenize::from_token(account).ok()?,
                    })
                }
            }
        });
    }

    #[test]
    fn contract_error_dispatches_every_error() {
        let cx = context(ABI);
        let tokens = expand(&cx).unwrap().to_string();
        let variant = quote! { OwnableUnauthorizedAccount(OwnableUnauthorizedAccount), };
        assert!(tokens.contains(&variant.to_string()));
    }
}
