use crate::generate::{types, Context};
use crate::util;
use anyhow::{anyhow, Result};
use assetbind_common::abi::Param;
use assetbind_common::Abi;
use proc_macro2::{Ident, Literal, TokenStream};
use quote::quote;
use std::collections::btree_map::{BTreeMap, Entry};

/// The structs declared through `internalType` of tuple parameters, keyed by
/// their qualified Solidity name.
#[derive(Debug, Default)]
pub(crate) struct Structs {
    by_path: BTreeMap<String, Struct>,
}

#[derive(Debug)]
struct Struct {
    name: Ident,
    fields: Vec<Param>,
}

impl Structs {
    /// Collects every struct referenced anywhere in the ABI.
    pub fn collect(abi: &Abi) -> Result<Self> {
        let mut structs = Structs::default();
        let params = abi
            .functions()
            .iter()
            .flat_map(|function| function.inputs.iter().chain(&function.outputs))
            .chain(abi.events().iter().flat_map(|event| {
                event.inputs.iter().map(|input| &input.param)
            }))
            .chain(abi.errors().iter().flat_map(|error| &error.inputs))
            .chain(abi.constructor().into_iter().flat_map(|c| &c.inputs));
        for param in params {
            structs.visit(param)?;
        }

        let mut names = BTreeMap::new();
        for (path, definition) in &structs.by_path {
            if let Some(other) = names.insert(definition.name.to_string(), path) {
                return Err(anyhow!(
                    "structs {} and {} would both be named {}",
                    other,
                    path,
                    definition.name,
                ));
            }
        }

        Ok(structs)
    }

    fn visit(&mut self, param: &Param) -> Result<()> {
        if param.tuple_type().is_none() {
            return Ok(());
        }
        for component in &param.components {
            self.visit(component)?;
        }

        let (path, name) = match (param.struct_path(), param.struct_name()) {
            (Some(path), Some(name)) => (path, name),
            _ => return Ok(()),
        };
        match self.by_path.entry(path.to_owned()) {
            Entry::Occupied(entry) if entry.get().fields != param.components => Err(anyhow!(
                "conflicting definitions for struct {}",
                path
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(Struct {
                    name: util::type_ident(name),
                    fields: param.components.clone(),
                });
                Ok(())
            }
        }
    }

    /// The Rust identifier of a struct.
    pub fn ident(&self, path: &str) -> Option<&Ident> {
        self.by_path.get(path).map(|definition| &definition.name)
    }
}

pub(crate) fn expand(cx: &Context) -> Result<TokenStream> {
    let structs = cx
        .structs
        .by_path
        .iter()
        .map(|(path, definition)| {
            let doc = util::expand_doc(&format!("Solidity struct `{}`.", path));
            expand_struct(cx, &definition.name, doc, &definition.fields)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! { #( #structs )* })
}

/// Expands a struct with one public field per parameter that is encoded as
/// a tuple of its fields.
pub(crate) fn expand_struct(
    cx: &Context,
    name: &Ident,
    doc: TokenStream,
    fields: &[Param],
) -> Result<TokenStream> {
    let derives = &cx.event_derives;
    let count = Literal::usize_unsuffixed(fields.len());
    let names = util::param_names(fields.iter().map(|field| field.name.as_str()));
    let types = fields
        .iter()
        .map(|field| types::expand_param(cx, field))
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #doc
        #[derive(Clone, Debug, Eq, PartialEq, #( #derives ),*)]
        pub struct #name {
            #( pub #names: #types, )*
        }

        impl assetbind::tokens::Tokenize for #name {
            fn from_token(
                token: assetbind::common::abi::Token,
            ) -> Result<Self, assetbind::tokens::Error> {
                let [#( #names ),*] = assetbind::tokens::into_tuple::<#count>(token)?;
                Ok(#name {
                    #( #names: assetbind::tokens::Tokenize::from_token(#names)?, )*
                })
            }

            fn into_token(self) -> assetbind::common::abi::Token {
                assetbind::common::abi::Token::Tuple(vec![
                    #( assetbind::tokens::Tokenize::into_token(self.#names), )*
                ])
            }
        }

        impl assetbind::tokens::TokenizeArray for #name {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::context;

    const ABI: &str = r#"[
        {
            "type": "function",
            "name": "addEquity",
            "inputs": [{
                "name": "_equity",
                "type": "tuple",
                "internalType": "struct EquityContractV3.Equity",
                "components": [
                    { "name": "name", "type": "string", "internalType": "string" },
                    { "name": "issuer", "type": "address", "internalType": "address" }
                ]
            }],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "getEquityDetailsFromId",
            "inputs": [{ "name": "_id", "type": "uint256", "internalType": "uint256" }],
            "outputs": [{
                "name": "",
                "type": "tuple",
                "internalType": "struct EquityContractV3.Equity",
                "components": [
                    { "name": "name", "type": "string", "internalType": "string" },
                    { "name": "issuer", "type": "address", "internalType": "address" }
                ]
            }],
            "stateMutability": "view"
        }
    ]"#;

    #[test]
    fn structs_are_deduplicated() {
        let cx = context(ABI);
        assert_eq!(cx.structs.by_path.len(), 1);
        assert_eq!(
            cx.structs.ident("EquityContractV3.Equity").unwrap().to_string(),
            "Equity"
        );
    }

    #[test]
    fn expand_struct_tokenize() {
        let cx = context(ABI);
        assert_quote!(expand(&cx).unwrap(), {
            #[doc = "Solidity struct `EquityContractV3.Equity`."]
            #[derive(Clone, Debug, Eq, PartialEq,)]
            pub struct Equity {
                pub name: String,
                pub issuer: assetbind::Address,
            }

            impl assetbind::tokens::Tokenize for Equity {
                fn from_token(
                    token: assetbind::common::abi::Token,
                ) -> Result<Self, assetbind::tokens::Error> {
                    let [name, issuer] = assetbind::tokens::into_tuple::<2>(token)?;
                    Ok(Equity {
                        name: assetbind::tokens::Tokenize::from_token(name)?,
                        issuer: assetbind::tokens::Tokenize::from_token(issuer)?,
                    })
                }

                fn into_token(self) -> assetbind::common::abi::Token {
                    assetbind::common::abi::Token::Tuple(vec![
                        assetbind::tokens::Tokenize::into_token(self.name),
                        assetbind::tokens::Tokenize::into_token(self.issuer),
                    ])
                }
            }

            impl assetbind::tokens::TokenizeArray for Equity {}
        });
    }

    #[test]
    fn conflicting_structs_are_rejected() {
        let abi = ABI.replacen(
            r#"{ "name": "issuer", "type": "address", "internalType": "address" }"#,
            r#"{ "name": "issuer", "type": "bool", "internalType": "bool" }"#,
            1,
        );
        let contract = assetbind_common::ArtifactLoader::new()
            .name("Test")
            .load_contract_from_str(&abi)
            .unwrap();
        assert!(Structs::collect(&contract.abi).is_err());
    }
}
