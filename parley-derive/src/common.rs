use darling::util::SpannedValue;
use heck::{ToKebabCase as _, ToShoutySnakeCase as _};
use itertools::Itertools as _;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::ToTokens;
use syn::{Attribute, Expr, Ident, spanned::Spanned as _};

pub struct IdentString<'a> {
    raw: &'a Ident,
    string: String,
}

impl<'a> IdentString<'a> {
    pub fn new(ident: &'a Ident) -> Self {
        Self {
            string: ident.to_string(),
            raw: ident,
        }
    }

    pub fn as_str(&self) -> &str {
        self.string.as_str()
    }

    pub fn span(&self) -> Span {
        self.raw.span()
    }
}

impl ToTokens for IdentString<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        self.raw.to_tokens(tokens);
    }
}

/// Join the `///` comments on an item into a description. Leading spaces
/// are trimmed from each line, and blank lines become paragraph breaks.
pub fn compute_docs(attrs: &[Attribute]) -> syn::Result<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match attr.meta {
            syn::Meta::NameValue(ref meta) => Some(meta),
            _ => None,
        })
        .filter(|meta| meta.path.is_ident("doc"))
        .map(|meta| match meta.value {
            Expr::Lit(ref lit) => match lit.lit {
                syn::Lit::Str(ref lit) => Ok(lit.value()),
                _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
            },
            Expr::Macro(ref expr) => Err(syn::Error::new(
                expr.span(),
                "macro #[doc] attributes aren't supported",
            )),
            _ => Err(syn::Error::new(meta.span(), "malformed #[doc] attribute")),
        })
        .try_collect()?;

    Ok(lines
        .iter()
        .map(|line| line.trim())
        .join("\n")
        .split("\n\n")
        .map(|paragraph| paragraph.split('\n').join(" "))
        .join("\n\n")
        .trim()
        .to_owned())
}

pub fn compute_long(
    long: Option<SpannedValue<String>>,
    field_name: &IdentString<'_>,
) -> syn::Result<SpannedValue<String>> {
    let long = long.unwrap_or_else(|| {
        SpannedValue::new(field_name.as_str().to_kebab_case(), field_name.span())
    });

    if long.starts_with('-') {
        Err(syn::Error::new(
            long.span(),
            "long tags are written without their dashes; they're added automatically",
        ))
    } else if !long.starts_with(|c: char| c.is_alphabetic()) {
        Err(syn::Error::new(
            long.span(),
            "long tags should start with something alphabetic",
        ))
    } else if long.contains(['=', ':']) {
        Err(syn::Error::new(
            long.span(),
            "long tags must not include '=' or ':', as they separate the value",
        ))
    } else if long.contains(char::is_whitespace) {
        Err(syn::Error::new(
            long.span(),
            "long tags shouldn't include whitespace",
        ))
    } else {
        Ok(long)
    }
}

pub fn compute_short(
    short: Option<SpannedValue<char>>,
    field_name: &IdentString<'_>,
) -> syn::Result<SpannedValue<char>> {
    let c = match short {
        Some(short) => short,
        None => match field_name.as_str().chars().next() {
            Some(c) => SpannedValue::new(c, field_name.span()),
            None => return Err(syn::Error::new(field_name.span(), "empty field name")),
        },
    };

    if matches!(*c, '-' | ':' | '=') {
        Err(syn::Error::new(
            c.span(),
            "short tags must not be '-', ':' or '='",
        ))
    } else if !c.is_ascii_graphic() {
        Err(syn::Error::new(
            c.span(),
            "short tags should be an ascii printable",
        ))
    } else {
        Ok(c)
    }
}

pub fn compute_placeholder(
    placeholder: Option<SpannedValue<String>>,
    field_name: &IdentString<'_>,
) -> syn::Result<SpannedValue<String>> {
    let placeholder = placeholder.unwrap_or_else(|| {
        SpannedValue::new(
            field_name.as_str().to_shouty_snake_case(),
            field_name.span(),
        )
    });

    if placeholder.contains(char::is_whitespace) {
        Err(syn::Error::new(
            placeholder.span(),
            "placeholder shouldn't include whitespace",
        ))
    } else {
        Ok(placeholder)
    }
}
