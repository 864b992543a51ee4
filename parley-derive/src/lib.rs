/*!
Derive macros for `parley`. Use them through the re-exports in `parley`
itself: `#[derive(parley::Model)]` and `#[derive(parley::Value)]`.
*/

mod common;
mod model;
mod value;

use proc_macro::TokenStream;

/**
Implement `parley::Model` for a struct with named fields.

Each field becomes a symbol bound to the field's name. A field with a `long`,
`short`, or `alias` tag is an option (or a switch, if it's a `bool`); a field
without tags is a positional argument, matched in declaration order. The
field's type decides its arity: `T` takes exactly one value, `Option<T>` at
most one, and `Vec<T>` any number. Doc comments become descriptions.

Field attributes, under `#[parley(...)]`:

- `long` or `long = "name"`: a `--name` tag, by default the field's name in
  kebab-case
- `short` or `short = 'n'`: a `-n` tag, by default the field's first letter
- `alias = "--other"`: an extra tag, written with its dashes; may be repeated
- `default` or `default = expr`: the value used when the symbol is absent
- `placeholder = "NAME"`: the value's name in usage messages
- `group = "Label"`: list the symbol under its own heading in usage messages
- `precedence = n`: a positional argument's matching order
- `descendant`: make the symbol visible to subcommands too
- `inherited`: don't declare a symbol; the value comes from a `descendant`
  symbol declared by an ancestor command
*/
#[proc_macro_derive(Model, attributes(parley))]
pub fn derive_model(item: TokenStream) -> TokenStream {
    match model::derive_model_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/**
Implement `FromStr` and `Display` for a value type, so that it can be
registered with `ConverterRegistry::register_parsed`.

On an enum of unit variants, each variant is written as its name in
kebab-case, matched without regard to case. On a struct with exactly one
field, both traits forward to the field.
*/
#[proc_macro_derive(Value, attributes(parley))]
pub fn derive_value(item: TokenStream) -> TokenStream {
    match value::derive_value_result(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
