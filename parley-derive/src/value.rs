use heck::ToKebabCase as _;
use itertools::Itertools as _;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, Token, Variant, punctuated::Punctuated, spanned::Spanned as _};

/// Each unit variant, with the kebab-case name it's written as
fn analyze_variants(
    variants: &Punctuated<Variant, Token![,]>,
) -> syn::Result<Vec<(String, &Ident)>> {
    variants
        .iter()
        .map(|variant| match variant.fields {
            Fields::Unit => Ok((variant.ident.to_string().to_kebab_case(), &variant.ident)),
            Fields::Named(_) | Fields::Unnamed(_) => Err(syn::Error::new(
                variant.span(),
                "`Value` enums can only have unit variants",
            )),
        })
        .try_collect()
}

fn derive_value_enum(
    ident: &Ident,
    variants: &Punctuated<Variant, Token![,]>,
) -> syn::Result<TokenStream2> {
    let analyzed = analyze_variants(variants)?;

    let names: Vec<&str> = analyzed.iter().map(|(name, _)| name.as_str()).collect();
    let idents: Vec<&Ident> = analyzed.iter().map(|&(_, variant)| variant).collect();

    Ok(quote! {
        impl ::core::str::FromStr for #ident {
            type Err = ::parley::UnknownVariant;

            fn from_str(input: &str) -> ::core::result::Result<Self, Self::Err> {
                #(
                    if input.eq_ignore_ascii_case(#names) {
                        return ::core::result::Result::Ok(Self::#idents);
                    }
                )*

                ::core::result::Result::Err(::parley::UnknownVariant {
                    input: ::std::borrow::ToOwned::to_owned(input),
                    expected: &[ #(#names,)* ],
                })
            }
        }

        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(match *self {
                    #(Self::#idents => #names,)*
                })
            }
        }
    })
}

fn derive_value_newtype(ident: &Ident, field: Option<&Ident>) -> TokenStream2 {
    let (construct, access) = match field {
        Some(field) => (quote! { Self { #field: value } }, quote! { self.#field }),
        None => (quote! { Self(value) }, quote! { self.0 }),
    };

    quote! {
        impl ::core::str::FromStr for #ident {
            type Err = ::std::string::String;

            fn from_str(input: &str) -> ::core::result::Result<Self, Self::Err> {
                match input.parse() {
                    ::core::result::Result::Ok(value) => ::core::result::Result::Ok(#construct),
                    ::core::result::Result::Err(err) => {
                        ::core::result::Result::Err(::std::string::ToString::to_string(&err))
                    }
                }
            }
        }

        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&#access, f)
            }
        }
    }
}

pub fn derive_value_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "can't derive `Value` on a generic type",
        ));
    }

    match input.data {
        Data::Struct(ref data) => {
            let field = data.fields.iter().exactly_one().map_err(|_| {
                syn::Error::new(
                    input.span(),
                    "can only derive `Value` on structs with exactly one field",
                )
            })?;

            Ok(derive_value_newtype(&input.ident, field.ident.as_ref()))
        }
        Data::Enum(ref data) => derive_value_enum(&input.ident, &data.variants),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "can't derive `Value` on a union",
        )),
    }
}
