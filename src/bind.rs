use tracing::trace;

use crate::{
    convert::ConverterRegistry,
    errors::BindError,
    lookup::ParseResult,
    model::{Bindings, Origin, Slot},
    symbol::{SymbolKind, Value},
    validate::ValidatorRegistry,
};

/**
Convert and validate every matched value, producing a slot for every visible
symbol. Symbols with no values get their default, if they have one; absent
switches are `false`.

A problem with one symbol doesn't prevent the others from being processed;
every conversion and validation error is collected.
*/
pub fn bind(
    parsed: &ParseResult<'_>,
    converters: &ConverterRegistry,
    validators: &ValidatorRegistry,
) -> (Bindings, Vec<BindError>) {
    let mut bindings = Bindings::new();
    let mut errors = Vec::new();

    for (symbol, matched) in parsed.iter() {
        let slot = if !matched.values.is_empty() {
            let converter = symbol
                .converter()
                .or_else(|| converters.get(symbol.value_type().id()));

            let type_validators = validators.for_type(symbol.value_type().id());
            let mut values: Vec<Value> = Vec::with_capacity(matched.values.len());

            for raw in &matched.values {
                let converted = match (symbol.kind(), converter) {
                    (SymbolKind::Switch, _) => {
                        Ok(Box::new(raw.eq_ignore_ascii_case("true")) as Value)
                    }
                    (_, Some(converter)) => converter.convert(raw),
                    (_, None) => Err("no converter is registered".to_owned()),
                };

                let value = match converted {
                    Ok(value) => value,
                    Err(message) => {
                        errors.push(BindError::Conversion {
                            symbol: symbol.label(),
                            value: raw.clone(),
                            type_name: symbol.value_type().name(),
                            message,
                        });
                        continue;
                    }
                };

                let rejections = symbol
                    .validators()
                    .iter()
                    .chain(type_validators)
                    .filter_map(|validator| validator.validate(&*value).err());

                let before = errors.len();
                errors.extend(rejections.map(|message| BindError::Validation {
                    symbol: symbol.label(),
                    value: raw.clone(),
                    message,
                }));

                if errors.len() == before {
                    values.push(value);
                }
            }

            Slot::new(Origin::CommandLine, values)
        } else if let Some(default) = symbol.default_value_of() {
            Slot::new(Origin::Default, vec![default])
        } else if symbol.kind() == SymbolKind::Switch {
            Slot::new(Origin::Default, vec![Box::new(false) as Value])
        } else {
            Slot::new(Origin::Absent, Vec::new())
        };

        trace!(binding = symbol.binding(), origin = ?slot.origin(), values = slot.len(), "bound");
        bindings.insert(symbol.binding(), slot);
    }

    (bindings, errors)
}
