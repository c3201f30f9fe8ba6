use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::Data::Enum;
use syn::{DeriveInput, Ident};

fn parse_derive_input(input: TokenStream, macro_name: &str) -> DeriveInput {
    syn::parse(input).unwrap_or_else(|err| panic!("{macro_name}: unable to parse input: {err}"))
}

/// Collect the variant identifiers of a fieldless enum, panicking with a message that names the
/// calling macro if the input is not an enum or if any variant carries fields.
fn fieldless_variants<'a>(ast: &'a DeriveInput, macro_name: &str) -> Vec<&'a Ident> {
    let name = &ast.ident;

    let Enum(data) = &ast.data else {
        panic!("{macro_name} can only be derived for enums; {name} is not an enum");
    };

    data.variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            assert!(
                variant.fields.is_empty(),
                "{macro_name} requires fieldless variants; {name}::{variant_name} has fields"
            );
            variant_name
        })
        .collect()
}

/// Derive `std::fmt::Display` for a fieldless enum, printing each variant's identifier verbatim.
///
/// Register and condition enums rely on this to print assembler mnemonics (`HL`, `NZ`, ...).
#[proc_macro_derive(EnumDisplay)]
pub fn enum_display(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input, "EnumDisplay");
    let name = &ast.ident;

    let match_arms = fieldless_variants(&ast, "EnumDisplay").into_iter().map(|variant| {
        let text = variant.to_string();
        quote! { Self::#variant => f.write_str(#text) }
    });

    quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#match_arms,)*
                }
            }
        }
    }
    .into()
}

/// Derive `std::str::FromStr` for a fieldless enum. Matching ignores ASCII case and the error type
/// is a `String` describing the rejected input.
#[proc_macro_derive(EnumFromStr)]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input, "EnumFromStr");
    let name = &ast.ident;

    let match_arms = fieldless_variants(&ast, "EnumFromStr").into_iter().map(|variant| {
        let lowercase = variant.to_string().to_ascii_lowercase();
        quote! { #lowercase => Ok(Self::#variant) }
    });

    let error_format = format!("unrecognized {name} value: '{{}}'");

    quote! {
        impl ::std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    #(#match_arms,)*
                    _ => Err(format!(#error_format, s)),
                }
            }
        }
    }
    .into()
}

/// Derive `serde::Deserialize` by reading a string and handing it to the type's `FromStr` impl.
/// The deriving crate must depend on `serde`.
#[proc_macro_derive(StrDeserialize)]
pub fn str_deserialize(input: TokenStream) -> TokenStream {
    let ast = parse_derive_input(input, "StrDeserialize");
    let ident = &ast.ident;

    let visitor = format_ident!("__{}StrVisitor", ident);
    let expecting = format!("a string naming a {ident}");

    quote! {
        struct #visitor;

        impl<'de> serde::de::Visitor<'de> for #visitor {
            type Value = #ident;

            fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                formatter.write_str(#expecting)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(serde::de::Error::custom)
            }
        }

        impl<'de> serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_str(#visitor)
            }
        }
    }
    .into()
}
