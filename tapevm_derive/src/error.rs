//! Derive macro for error enums.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations
//! from `#[error("...")]` variant attributes.
//!
//! # Usage
//!
//! ```ignore
//! use tapevm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MyError {
//!     #[error("unknown fragment: {0}")]
//!     Unknown(String),
//!
//!     #[error("expected {expected} operands, got {actual}")]
//!     Arity { expected: usize, actual: usize },
//! }
//! ```
//!
//! Unit variants, tuple variants (`{0}`, `{1}`) and struct variants
//! (`{field}`) are supported. Only enums can derive `Error`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Variant};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive supports enums only",
        ));
    };

    let arms = data
        .variants
        .iter()
        .map(display_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::std::error::Error for #name {}
    })
}

/// Builds one `Display` match arm from a variant's `#[error("...")]` message.
fn display_arm(variant: &Variant) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &variant.ident;
    let message = error_message(variant)?;

    Ok(match &variant.fields {
        Fields::Unit => quote! {
            Self::#ident => write!(f, #message),
        },
        Fields::Unnamed(fields) => {
            let bindings: Vec<_> = (0..fields.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let format = positional_to_named(&message.value(), bindings.len());
            quote! {
                Self::#ident(#(#bindings),*) => write!(f, #format, #(#bindings = #bindings),*),
            }
        }
        Fields::Named(fields) => {
            let bindings: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            quote! {
                Self::#ident { #(#bindings),* } => write!(f, #message, #(#bindings = #bindings),*),
            }
        }
    })
}

/// Extracts the string literal from the variant's `#[error("...")]` attribute.
fn error_message(variant: &Variant) -> syn::Result<LitStr> {
    for attr in &variant.attrs {
        if attr.path().is_ident("error") {
            return attr.parse_args::<LitStr>().map_err(|_| {
                syn::Error::new_spanned(
                    attr,
                    "expected a string literal, e.g. #[error(\"bad opcode: {0}\")]",
                )
            });
        }
    }
    Err(syn::Error::new_spanned(
        variant,
        format!(
            "variant `{}` is missing its #[error(\"...\")] attribute",
            variant.ident
        ),
    ))
}

/// Rewrites `{0}`/`{1}` placeholders (with or without a format spec, as
/// in `{0:#04x}`) to the `f0`/`f1` bindings used in the arm.
fn positional_to_named(format: &str, field_count: usize) -> String {
    let mut out = format.to_string();
    for i in 0..field_count {
        out = out.replace(&format!("{{{}}}", i), &format!("{{f{}}}", i));
        out = out.replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    out
}
