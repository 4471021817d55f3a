use anyhow::Result;
#[cfg(feature = "http")]
use curl::easy::Easy;
use inflector::Inflector;
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;
use std::collections::HashSet;
use syn::Ident as SynIdent;

/// Expands a identifier string into an token.
pub fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

/// Expands an identifier string into a token and appending `_` if the
/// identifier is for a reserved keyword.
///
/// Parsing keywords like `self` can fail, in this case we add an underscore.
pub fn safe_ident(name: &str) -> Ident {
    syn::parse_str::<SynIdent>(name).unwrap_or_else(|_| ident(&format!("{}_", name)))
}

/// The snake cased Rust identifier for an ABI parameter or method name.
/// Unnamed parameters are named after their position.
pub fn snake_ident(name: &str, index: usize) -> Ident {
    let name = name.to_snake_case();
    if name.is_empty() {
        ident(&format!("p{}", index))
    } else {
        safe_ident(&name)
    }
}

/// The Rust type identifier for an ABI event, error or struct name. Names
/// are kept as declared with the first letter capitalized.
pub fn type_ident(name: &str) -> Ident {
    let mut chars = name.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    safe_ident(&name)
}

/// Snake cased identifiers for a parameter list. Unnamed parameters and
/// parameters whose name clashes with an earlier one are named after their
/// position.
pub fn param_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Ident> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = snake_ident(name, i);
            if seen.insert(name.to_string()) {
                name
            } else {
                ident(&format!("p{}", i))
            }
        })
        .collect()
}

/// Expands a doc string into an attribute token stream.
pub fn expand_doc(s: &str) -> TokenStream {
    let doc = Literal::string(s);
    quote! {
        #[doc = #doc]
    }
}

/// Expands a byte array into a `[u8; N]` literal.
pub fn expand_bytes(bytes: &[u8]) -> TokenStream {
    let bytes = bytes.iter().copied().map(Literal::u8_suffixed);
    quote! { [#( #bytes ),*] }
}

/// Perform an HTTP GET request and return the contents of the response.
#[cfg(feature = "http")]
pub fn http_get(url: &str) -> Result<String> {
    let mut buffer = Vec::new();
    let mut handle = Easy::new();
    handle.url(url)?;
    handle.follow_location(true)?;
    {
        let mut transfer = handle.transfer();
        transfer.write_function(|data| {
            buffer.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = handle.response_code()?;
    if !(200..300).contains(&code) {
        anyhow::bail!("request to {} failed with status {}", url, code);
    }

    let buffer = String::from_utf8(buffer)?;
    Ok(buffer)
}

/// Perform an HTTP GET request and return the contents of the response.
#[cfg(not(feature = "http"))]
pub fn http_get(url: &str) -> Result<String> {
    Err(anyhow::anyhow!(
        "cannot fetch {}, HTTP sources require the `http` feature",
        url
    ))
}
