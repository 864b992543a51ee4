use std::{
    collections::{HashMap, hash_map::Entry},
    fmt::Display,
    hash::Hash,
};

use darling::{
    FromAttributes as _,
    util::{Override, SpannedValue},
};
use itertools::Itertools as _;
use lazy_format::lazy_format;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, Field, Fields, GenericArgument, PathArguments, Type,
    spanned::Spanned as _,
};

use crate::common::{
    IdentString, compute_docs, compute_long, compute_placeholder, compute_short,
};

#[derive(darling::FromAttributes, Debug)]
#[darling(attributes(parley))]
struct RawFieldAttr {
    long: Option<Override<SpannedValue<String>>>,
    short: Option<Override<SpannedValue<char>>>,
    #[darling(multiple)]
    alias: Vec<SpannedValue<String>>,
    default: Option<Override<Expr>>,
    placeholder: Option<SpannedValue<String>>,
    group: Option<String>,
    precedence: Option<usize>,

    // Visible to subcommands as well
    descendant: Option<()>,

    // Declared by an ancestor command; only read from the bindings
    inherited: Option<()>,
}

enum FieldDefault {
    None,
    Trait,
    Expr(Expr),
}

impl FieldDefault {
    fn new(default: Option<Override<Expr>>) -> Self {
        match default {
            Some(Override::Explicit(default)) => Self::Expr(default),
            Some(Override::Inherit) => Self::Trait,
            None => Self::None,
        }
    }
}

/// How a field's type maps to a symbol's values
enum Shape<'a> {
    /// `T`: exactly one value
    Required(&'a Type),

    /// `Option<T>`: zero or one value
    Optional(&'a Type),

    /// `Vec<T>`: any number of values
    Many(&'a Type),
}

impl<'a> Shape<'a> {
    fn of(ty: &'a Type) -> Self {
        if let Some(inner) = wrapped(ty, "Option") {
            Self::Optional(inner)
        } else if let Some(inner) = wrapped(ty, "Vec") {
            Self::Many(inner)
        } else {
            Self::Required(ty)
        }
    }

    fn value_type(&self) -> &'a Type {
        match *self {
            Shape::Required(ty) | Shape::Optional(ty) | Shape::Many(ty) => ty,
        }
    }
}

/// If `ty` is `Wrapper<T>`, get `T`
fn wrapped<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(ref path) = *ty else {
        return None;
    };

    if path.qself.is_some() {
        return None;
    }

    let segment = path.path.segments.last()?;

    if segment.ident != wrapper {
        return None;
    }

    match segment.arguments {
        PathArguments::AngleBracketed(ref args) => match args.args.iter().exactly_one() {
            Ok(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn is_bool(ty: &Type) -> bool {
    matches!(*ty, Type::Path(ref path) if path.qself.is_none() && path.path.is_ident("bool"))
}

struct FieldInfo<'a> {
    ident: IdentString<'a>,
    shape: Shape<'a>,
    long: Option<SpannedValue<String>>,
    short: Option<SpannedValue<char>>,
    aliases: Vec<SpannedValue<String>>,
    default: FieldDefault,
    placeholder: SpannedValue<String>,
    group: Option<String>,
    precedence: Option<usize>,
    descendant: bool,
    inherited: bool,
    docs: String,
}

impl<'a> FieldInfo<'a> {
    fn from_field(field: &'a Field) -> syn::Result<Self> {
        let parsed = RawFieldAttr::from_attributes(&field.attrs)?;
        let docs = compute_docs(&field.attrs)?;

        let ident = field
            .ident
            .as_ref()
            .map(IdentString::new)
            .ok_or_else(|| syn::Error::new(field.span(), "models need named fields"))?;

        let long = parsed
            .long
            .map(|long| compute_long(long.explicit(), &ident))
            .transpose()?;

        let short = parsed
            .short
            .map(|short| compute_short(short.explicit(), &ident))
            .transpose()?;

        let placeholder = compute_placeholder(parsed.placeholder, &ident)?;

        Ok(Self {
            shape: Shape::of(&field.ty),
            long,
            short,
            aliases: parsed.alias,
            default: FieldDefault::new(parsed.default),
            placeholder,
            group: parsed.group,
            precedence: parsed.precedence,
            descendant: parsed.descendant.is_some(),
            inherited: parsed.inherited.is_some(),
            docs,
            ident,
        })
    }

    fn has_tags(&self) -> bool {
        self.long.is_some() || self.short.is_some() || !self.aliases.is_empty()
    }

    fn is_switch(&self) -> bool {
        self.has_tags() && matches!(self.shape, Shape::Required(ty) if is_bool(ty))
    }

    /// The expression that declares this field's symbol
    fn symbol(&self) -> TokenStream2 {
        let binding = self.ident.as_str();
        let value_type = self.shape.value_type();

        let constructor = match (self.is_switch(), self.has_tags()) {
            (true, _) => quote! { ::parley::Symbol::switch(#binding) },
            (false, true) => quote! { ::parley::Symbol::option::<#value_type>(#binding) },
            (false, false) => quote! { ::parley::Symbol::argument::<#value_type>(#binding) },
        };

        let long = self.long.as_ref().map(|long| {
            let long = long.as_str();
            quote! { .long(#long) }
        });

        let short = self.short.map(|short| {
            let short = *short;
            quote! { .short(#short) }
        });

        let aliases = self.aliases.iter().map(|alias| {
            let alias = alias.as_str();
            quote! { .alias(#alias) }
        });

        let arity = match (&self.shape, self.is_switch()) {
            (_, true) | (Shape::Required(_), false) => None,
            (Shape::Optional(_), false) => Some(quote! { .optional() }),
            (Shape::Many(_), false) => Some(quote! { .many().optional() }),
        };

        let default = match self.default {
            FieldDefault::None => None,
            FieldDefault::Trait => Some(quote! {
                .default_with(<#value_type as ::core::default::Default>::default)
            }),
            FieldDefault::Expr(ref expr) => Some(quote! {
                .default_with(|| -> #value_type { #expr })
            }),
        };

        let placeholder = self.placeholder.as_str();

        let describe = match self.docs.as_str() {
            "" => None,
            docs => Some(quote! { .describe(#docs) }),
        };

        let group = self.group.as_deref().map(|group| quote! { .group(#group) });

        let precedence = self
            .precedence
            .map(|precedence| quote! { .precedence(#precedence) });

        let scope = self
            .descendant
            .then(|| quote! { .scope(::parley::Scope::Descendant) });

        quote! {
            #constructor
                #long
                #short
                #(#aliases)*
                #arity
                #default
                .placeholder(#placeholder)
                #describe
                #group
                #precedence
                #scope
        }
    }

    /// The field initializer that takes this field's values out of the
    /// bindings
    fn initializer(&self) -> TokenStream2 {
        let ident = &self.ident;
        let binding = self.ident.as_str();

        let take = match self.shape {
            Shape::Required(_) => quote! { take_required },
            Shape::Optional(_) => quote! { take_optional },
            Shape::Many(_) => quote! { take_all },
        };

        quote! { #ident: bindings.#take(#binding)?, }
    }
}

fn detect_collision<T: Hash + Eq + Copy, M: Display>(
    known_tags: &mut HashMap<T, Span>,
    new_tag: Option<SpannedValue<T>>,
    message: impl Fn(T) -> M,
) -> syn::Result<()> {
    match new_tag {
        Some(tag) => match known_tags.entry(*tag) {
            Entry::Occupied(entry) => {
                let mut err1 = syn::Error::new(
                    tag.span(),
                    lazy_format!("duplicate tag {tag}", tag = message(*tag)),
                );
                let err2 = syn::Error::new(*entry.get(), "original use here");

                err1.combine(err2);
                Err(err1)
            }
            Entry::Vacant(entry) => {
                entry.insert(tag.span());
                Ok(())
            }
        },
        None => Ok(()),
    }
}

pub fn derive_model_result(item: TokenStream2) -> syn::Result<TokenStream2> {
    let input: DeriveInput = syn::parse2(item)?;
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "can't derive `Model` on a generic type",
        ));
    }

    let fields = match input.data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => fields.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.span(),
                    "can only derive `Model` on structs with named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "can't derive `Model` on an enum; give each variant its own command",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "can't derive `Model` on a union",
            ));
        }
    };

    let fields: Vec<FieldInfo> = fields.into_iter().map(FieldInfo::from_field).try_collect()?;

    {
        let mut long_tags = HashMap::new();
        let mut short_tags = HashMap::new();

        for field in &fields {
            let long = field
                .long
                .as_ref()
                .map(|long| SpannedValue::new(long.as_str(), long.span()));

            detect_collision(&mut long_tags, long, |tag| lazy_format!("--{tag}"))?;
            detect_collision(&mut short_tags, field.short, |tag| lazy_format!("-{tag}"))?;
        }
    }

    let symbols = fields
        .iter()
        .filter(|field| !field.inherited)
        .map(FieldInfo::symbol);
    let initializers = fields.iter().map(FieldInfo::initializer);

    let body = match input.data {
        Data::Struct(ref data) if matches!(data.fields, Fields::Unit) => quote! {
            {
                let _ = bindings;
                Self
            }
        },
        _ => quote! { Self { #(#initializers)* } },
    };

    Ok(quote! {
        impl ::parley::Model for #ident {
            fn symbols() -> ::std::vec::Vec<::parley::Symbol> {
                ::std::vec![ #(#symbols,)* ]
            }

            fn build(
                bindings: &mut ::parley::Bindings,
            ) -> ::core::result::Result<Self, ::parley::errors::ModelError> {
                ::core::result::Result::Ok(#body)
            }
        }
    })
}
