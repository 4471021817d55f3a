#![deny(missing_docs, unsafe_code)]

//! Implementation of the procedural macro for generating type-safe bindings to
//! an asset contract.

extern crate proc_macro;

use anyhow::{anyhow, Result};
use assetbind_common::abi::ParamType;
use assetbind_generate::{ArtifactLoader, ContractBuilder, Source};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, ToTokens as _};
use std::collections::HashSet;
use std::env;
use syn::ext::IdentExt;
use syn::parse::{Error as ParseError, Parse, ParseStream, Result as ParseResult};
use syn::{
    braced, parenthesized, parse_macro_input, Error as SynError, Ident, LitStr, Path, Token,
    Visibility,
};

/// Proc macro to generate type-safe bindings to a contract.
///
/// This macro accepts a path to an artifact JSON file, either an object with
/// an `abi` field or a bare ABI array. The path is rooted in the crate's
/// `CARGO_MANIFEST_DIR`:
///
/// ```ignore
/// contract!("abi/Equity.json");
/// ```
///
/// HTTP(S) URLs are fetched when the `http` feature is enabled:
///
/// ```ignore
/// contract!("https://my.domain.local/abi/Equity.json");
/// ```
///
/// The macro accepts additional parameters to configure the generated code:
///
/// - `contract`: the name of the generated contract type. Bare ABI arrays
///   carry no name so this parameter is required for them.
///
/// - `mod`: name of the module to place the generated code in. This defaults
///   to the contract name converted into snake case. The contract type gets
///   re-exported in the context where the macro was invoked.
///
/// - `methods`: mappings from canonical method signatures to Rust method
///   names. Overloaded functions must be given distinct names this way.
///
///   ```ignore
///   contract!(
///       "abi/StockAsset.json",
///       methods {
///           mint(address, uint256, uint256) as mint_to;
///       },
///   );
///   ```
///
/// - `event_derives`: additional derives for event structs and enums.
///
/// - `crate`: the name of the `assetbind` crate, if it was renamed in the
///   `Cargo.toml`.
///
/// The path can be preceded by a visibility modifier such as `pub` or
/// `pub(crate)` which is applied to the generated module and the contract
/// re-export.
///
/// Full example:
///
/// ```ignore
/// contract!(
///     pub(crate) "abi/StockAsset.json",
///     contract = StockAsset,
///     mod = stock,
///     methods {
///         safeTransferFrom(address, address, uint256, uint256, bytes) as send_shares;
///     },
///     event_derives (serde::Deserialize, serde::Serialize),
///     crate = assetbind_renamed,
/// );
/// ```
#[proc_macro]
pub fn contract(input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(input as ContractArgs);
    let span = args.span;
    generate(args)
        .unwrap_or_else(|e| SynError::new(span, format!("{:?}", e)).to_compile_error())
        .into()
}

fn generate(args: ContractArgs) -> Result<TokenStream2> {
    let mut builder = ContractBuilder::new();
    builder.visibility_modifier = args.visibility;

    for parameter in args.parameters.into_iter() {
        match parameter {
            Parameter::Mod(name) => builder.contract_mod_override = Some(name),
            Parameter::Contract(name) => builder.contract_name_override = Some(name),
            Parameter::Crate(name) => builder.runtime_crate_name = name,
            Parameter::Methods(methods) => {
                for method in methods {
                    builder
                        .method_aliases
                        .insert(method.signature, method.alias);
                }
            }
            Parameter::EventDerives(derives) => builder.event_derives.extend(derives),
        }
    }

    let root = env::var("CARGO_MANIFEST_DIR")
        .map_err(|_| anyhow!("the CARGO_MANIFEST_DIR environment variable is not set"))?;
    let source = Source::with_root(root, &args.artifact_path)?;
    let json = source.artifact_json()?;

    let mut loader = ArtifactLoader::new();
    if let Some(name) = &builder.contract_name_override {
        loader = loader.name(name.clone());
    }
    let contract = loader.load_contract_from_str(&json)?;

    Ok(builder.generate(&contract)?.into_tokens())
}

/// Contract procedural macro arguments.
#[cfg_attr(test, derive(Debug))]
struct ContractArgs {
    span: Span,
    visibility: Option<String>,
    artifact_path: String,
    parameters: Vec<Parameter>,
}

impl Parse for ContractArgs {
    fn parse(input: ParseStream) -> ParseResult<Self> {
        let visibility = match input.parse::<Visibility>()? {
            Visibility::Inherited => None,
            token => Some(quote!(#token).to_string()),
        };

        let (span, artifact_path) = {
            let literal = input.parse::<LitStr>()?;
            (literal.span(), literal.value())
        };

        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }
        let parameters = input
            .parse_terminated::<_, Token![,]>(Parameter::parse)?
            .into_iter()
            .collect();

        Ok(ContractArgs {
            span,
            visibility,
            artifact_path,
            parameters,
        })
    }
}

/// A single procedural macro parameter.
#[cfg_attr(test, derive(Debug, Eq, PartialEq))]
enum Parameter {
    Mod(String),
    Contract(String),
    Crate(String),
    Methods(Vec<Method>),
    EventDerives(Vec<String>),
}

impl Parse for Parameter {
    fn parse(input: ParseStream) -> ParseResult<Self> {
        let name = input.call(Ident::parse_any)?;
        let param = match name.to_string().as_str() {
            "crate" => {
                input.parse::<Token![=]>()?;
                let name = input.call(Ident::parse_any)?.to_string();
                Parameter::Crate(name)
            }
            "mod" => {
                input.parse::<Token![=]>()?;
                let name = input.parse::<Ident>()?.to_string();
                Parameter::Mod(name)
            }
            "contract" => {
                input.parse::<Token![=]>()?;
                let name = input.parse::<Ident>()?.to_string();
                Parameter::Contract(name)
            }
            "methods" => {
                let content;
                braced!(content in input);
                let parsed = content.parse_terminated::<_, Token![;]>(Method::parse)?;

                let mut methods = Vec::with_capacity(parsed.len());
                let mut signatures = HashSet::new();
                let mut aliases = HashSet::new();
                for method in parsed {
                    if !signatures.insert(method.signature.clone()) {
                        return Err(ParseError::new(
                            method.span,
                            "duplicate method signature in `assetbind::contract!` macro invocation",
                        ));
                    }
                    if !aliases.insert(method.alias.clone()) {
                        return Err(ParseError::new(
                            method.span,
                            "duplicate method alias in `assetbind::contract!` macro invocation",
                        ));
                    }
                    methods.push(method)
                }

                Parameter::Methods(methods)
            }
            "event_derives" => {
                let content;
                parenthesized!(content in input);
                let derives = content
                    .parse_terminated::<_, Token![,]>(Path::parse)?
                    .into_iter()
                    .map(|path| path.to_token_stream().to_string())
                    .collect();
                Parameter::EventDerives(derives)
            }
            _ => {
                return Err(ParseError::new(
                    name.span(),
                    format!("unexpected named parameter `{}`", name),
                ))
            }
        };

        Ok(param)
    }
}

/// An explicitly named contract method.
#[cfg_attr(test, derive(Debug))]
struct Method {
    span: Span,
    signature: String,
    alias: String,
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature && self.alias == other.alias
    }
}

impl Eq for Method {}

impl Parse for Method {
    fn parse(input: ParseStream) -> ParseResult<Self> {
        let name = input.parse::<Ident>()?;
        let span = name.span();

        // Parameter types are parsed as a tuple so that arrays and nested
        // tuples are normalized into their canonical form.
        let content;
        parenthesized!(content in input);
        let types: TokenStream2 = content.parse()?;
        let types = format!("({})", types)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        let inputs = types
            .parse::<ParamType>()
            .map_err(|err| ParseError::new(span, err))?;
        let signature = format!("{}{}", name, inputs);

        input.parse::<Token![as]>()?;
        let alias = input.parse::<Ident>()?.to_string();

        Ok(Method {
            span,
            signature,
            alias,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! contract_args_result {
        ($($arg:tt)*) => {{
            use syn::parse::Parser;
            <ContractArgs as Parse>::parse.parse2(quote::quote! { $($arg)* })
        }};
    }
    macro_rules! contract_args {
        ($($arg:tt)*) => {
            contract_args_result!($($arg)*).expect("failed to parse contract args")
        };
    }
    macro_rules! contract_args_err {
        ($($arg:tt)*) => {
            contract_args_result!($($arg)*)
                .expect_err("expected parse contract args to error")
        };
    }

    fn method(signature: &str, alias: &str) -> Method {
        Method {
            span: Span::call_site(),
            signature: signature.into(),
            alias: alias.into(),
        }
    }

    #[test]
    fn parse_contract_args() {
        let args = contract_args!("abi/Equity.json");
        assert_eq!(args.artifact_path, "abi/Equity.json");
        assert_eq!(args.visibility, None);
        assert!(args.parameters.is_empty());
    }

    #[test]
    fn crate_parameter_accepts_keywords() {
        let args = contract_args!("abi/Equity.json", crate = crate);
        assert_eq!(args.parameters, &[Parameter::Crate("crate".into())]);
    }

    #[test]
    fn parse_contract_args_with_parameters() {
        let args = contract_args!(
            pub(crate) "abi/StockAsset.json",
            crate = foobar,
            mod = stock,
            contract = StockAsset,
            methods {
                mint(address, uint256, uint256) as mint_to;
                safeBatchTransferFrom(address, address, uint256[], uint256[], bytes) as send_batch;
            },
            event_derives (Asdf, a::B, a::b::c::D)
        );
        assert_eq!(args.visibility, Some(quote!(pub(crate)).to_string()));
        assert_eq!(args.artifact_path, "abi/StockAsset.json");
        assert_eq!(
            args.parameters,
            vec![
                Parameter::Crate("foobar".into()),
                Parameter::Mod("stock".into()),
                Parameter::Contract("StockAsset".into()),
                Parameter::Methods(vec![
                    method("mint(address,uint256,uint256)", "mint_to"),
                    method(
                        "safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)",
                        "send_batch"
                    ),
                ]),
                Parameter::EventDerives(vec![
                    "Asdf".into(),
                    "a :: B".into(),
                    "a :: b :: c :: D".into()
                ]),
            ],
        );
    }

    #[test]
    fn method_signatures_accept_tuples() {
        let args = contract_args!(
            "abi/Alternate.json",
            methods {
                settle((uint256, address)[2], bool) as settle_pair;
            }
        );
        assert_eq!(
            args.parameters,
            vec![Parameter::Methods(vec![method(
                "settle((uint256,address)[2],bool)",
                "settle_pair"
            )])],
        );
    }

    #[test]
    fn duplicate_method_rename_error() {
        contract_args_err!(
            "abi/Equity.json",
            methods {
                buy(uint256) as buy_1;
                buy(uint256) as buy_2;
            }
        );
        contract_args_err!(
            "abi/Equity.json",
            methods {
                buy(uint256) as buy;
                sell(uint256) as buy;
            }
        );
    }

    #[test]
    fn method_invalid_parameter_type() {
        contract_args_err!(
            "abi/Equity.json",
            methods {
                buy(uint7) as buy;
            }
        );
    }

    #[test]
    fn unknown_parameter_error() {
        contract_args_err!("abi/Equity.json", deployments { 1 => "0x00" });
    }
}
