use crate::generate::Context;
use anyhow::{anyhow, Result};
use assetbind_common::abi::{Param, ParamType};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Expands a parameter into its Rust type. Tuples that declare a struct in
/// their internal type use the generated struct.
pub(crate) fn expand_param(cx: &Context, param: &Param) -> Result<TokenStream> {
    if let (Some(path), Some(_)) = (param.struct_path(), param.tuple_type()) {
        let name = cx
            .structs
            .ident(path)
            .ok_or_else(|| anyhow!("unknown struct {}", path))?;
        return Ok(wrap_arrays(&param.kind, quote! { #name }));
    }
    expand_kind(cx, &param.kind, &param.components, false)
}

fn expand_kind(
    cx: &Context,
    kind: &ParamType,
    components: &[Param],
    element: bool,
) -> Result<TokenStream> {
    match kind {
        ParamType::Address => Ok(quote! { assetbind::Address }),
        ParamType::Bytes => Ok(quote! { Vec<u8> }),
        ParamType::Int(n) => match n / 8 {
            1 => Ok(quote! { i8 }),
            2 => Ok(quote! { i16 }),
            3..=4 => Ok(quote! { i32 }),
            5..=32 => Ok(quote! { assetbind::I256 }),
            _ => Err(anyhow!("unsupported solidity type int{}", n)),
        },
        ParamType::Uint(n) => match n / 8 {
            // `Vec<u8>` and `[u8; N]` are byte strings, so `uint8` array
            // elements use the big-integer carrier.
            1 if element => Ok(quote! { assetbind::U256 }),
            1 => Ok(quote! { u8 }),
            2 => Ok(quote! { u16 }),
            3..=4 => Ok(quote! { u32 }),
            5..=32 => Ok(quote! { assetbind::U256 }),
            _ => Err(anyhow!("unsupported solidity type uint{}", n)),
        },
        ParamType::Bool => Ok(quote! { bool }),
        ParamType::String => Ok(quote! { String }),
        ParamType::FixedBytes(n) => {
            let size = Literal::usize_unsuffixed(*n);
            Ok(quote! { [u8; #size] })
        }
        ParamType::Array(inner) => {
            let inner = expand_kind(cx, inner, components, true)?;
            Ok(quote! { Vec<#inner> })
        }
        ParamType::FixedArray(inner, n) => {
            let inner = expand_kind(cx, inner, components, true)?;
            let size = Literal::usize_unsuffixed(*n);
            Ok(quote! { [#inner; #size] })
        }
        ParamType::Tuple(kinds) => {
            let types = if components.len() == kinds.len() {
                components
                    .iter()
                    .map(|component| expand_param(cx, component))
                    .collect::<Result<Vec<_>>>()?
            } else {
                kinds
                    .iter()
                    .map(|kind| expand_kind(cx, kind, &[], false))
                    .collect::<Result<Vec<_>>>()?
            };
            Ok(quote! { (#( #types, )*) })
        }
    }
}

fn wrap_arrays(kind: &ParamType, inner: TokenStream) -> TokenStream {
    match kind {
        ParamType::Array(element) => {
            let element = wrap_arrays(element, inner);
            quote! { Vec<#element> }
        }
        ParamType::FixedArray(element, n) => {
            let element = wrap_arrays(element, inner);
            let size = Literal::usize_unsuffixed(*n);
            quote! { [#element; #size] }
        }
        _ => inner,
    }
}

/// The Solidity source level type of a parameter, used in documentation.
pub(crate) fn solidity_type(param: &Param) -> String {
    match &param.internal_type {
        Some(internal_type) => match internal_type.strip_prefix("struct") {
            Some(path) if !path.starts_with(' ') => format!("struct {}", path),
            _ => internal_type.clone(),
        },
        None => param.kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::context;

    fn param(kind: ParamType) -> Param {
        Param::new("", kind)
    }

    #[test]
    fn expand_primitive_types() {
        let cx = context("[]");
        assert_quote!(expand_param(&cx, &param(ParamType::Address)).unwrap(), {
            assetbind::Address
        });
        assert_quote!(expand_param(&cx, &param(ParamType::Uint(8))).unwrap(), { u8 });
        assert_quote!(expand_param(&cx, &param(ParamType::Uint(24))).unwrap(), { u32 });
        assert_quote!(expand_param(&cx, &param(ParamType::Uint(64))).unwrap(), {
            assetbind::U256
        });
        assert_quote!(expand_param(&cx, &param(ParamType::Int(16))).unwrap(), { i16 });
        assert_quote!(expand_param(&cx, &param(ParamType::Int(128))).unwrap(), {
            assetbind::I256
        });
        assert_quote!(expand_param(&cx, &param(ParamType::FixedBytes(4))).unwrap(), {
            [u8; 4]
        });
        assert_quote!(expand_param(&cx, &param(ParamType::Bytes)).unwrap(), { Vec<u8> });
        assert_quote!(expand_param(&cx, &param(ParamType::String)).unwrap(), { String });
    }

    #[test]
    fn expand_arrays() {
        let cx = context("[]");
        let kind = ParamType::Array(Box::new(ParamType::FixedArray(
            Box::new(ParamType::Bool),
            2,
        )));
        assert_quote!(expand_param(&cx, &param(kind)).unwrap(), { Vec<[bool; 2]> });

        let bytes = ParamType::Array(Box::new(ParamType::Uint(8)));
        assert_quote!(expand_param(&cx, &param(bytes)).unwrap(), {
            Vec<assetbind::U256>
        });
    }

    #[test]
    fn expand_anonymous_tuples() {
        let cx = context("[]");
        let kind = ParamType::Tuple(vec![ParamType::Uint(256), ParamType::String]);
        assert_quote!(expand_param(&cx, &param(kind)).unwrap(), {
            (assetbind::U256, String,)
        });
    }

    #[test]
    fn expand_struct_types() {
        let cx = context(
            r#"[{
                "type": "function",
                "name": "positions",
                "inputs": [],
                "outputs": [{
                    "name": "",
                    "type": "tuple[]",
                    "internalType": "struct Ledger.Position[]",
                    "components": [
                        { "name": "id", "type": "uint256", "internalType": "uint256" }
                    ]
                }],
                "stateMutability": "view"
            }]"#,
        );
        let output = &cx.contract.abi.functions()[0].outputs[0];
        assert_quote!(expand_param(&cx, output).unwrap(), { Vec<Position> });
        assert_eq!(solidity_type(output), "struct Ledger.Position[]");

        let mut unspaced = output.clone();
        unspaced.internal_type = Some("structLedger.Position[]".to_owned());
        assert_eq!(solidity_type(&unspaced), "struct Ledger.Position[]");
    }
}
