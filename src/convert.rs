/*!
Conversion from raw argument text to typed values.

Every option and argument has a value type. Before a command line is built,
each of those types must have a converter in the [`ConverterRegistry`] (or the
symbol must carry its own). The registry comes preloaded with the standard
library types that usually show up on command lines; anything that implements
[`FromStr`] can be added with [`ConverterRegistry::register_parsed`].
*/

use std::{
    any::TypeId,
    collections::HashMap,
    ffi::OsString,
    fmt::{self, Debug, Display},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use crate::symbol::{Value, ValueType};

pub(crate) type ConvertFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// A type-erased conversion from text to a single value
#[derive(Clone)]
pub struct Converter {
    value_type: ValueType,
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub(crate) fn new(value_type: ValueType, convert: Arc<ConvertFn>) -> Self {
        Self {
            value_type,
            convert,
        }
    }

    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        (self.convert)(raw)
    }
}

impl Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Converter")
            .field(&self.value_type.name())
            .finish()
    }
}

/// The error produced by the built-in `bool` conversion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `true` or `false`")]
pub struct BoolError;

/// Parse a switch value: `true` or `false`, ignoring case
pub fn parse_bool(raw: &str) -> Result<bool, BoolError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(BoolError)
    }
}

/// The error produced by `#[derive(Value)]` conversions for an unrecognized
/// variant name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected one of: {}", .expected.join(", "))]
pub struct UnknownVariant {
    pub input: String,
    pub expected: &'static [&'static str],
}

/// Converters keyed by value type
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Converter>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// A registry with the built-in converters: `String`, `bool`, `char`,
    /// the integer and float types, paths, and network addresses.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry
            .register(|raw: &str| Ok::<_, std::convert::Infallible>(raw.to_owned()))
            .register(|raw: &str| Ok::<_, std::convert::Infallible>(PathBuf::from(raw)))
            .register(|raw: &str| Ok::<_, std::convert::Infallible>(OsString::from(raw)))
            .register(parse_bool)
            .register_parsed::<char>()
            .register_parsed::<i8>()
            .register_parsed::<i16>()
            .register_parsed::<i32>()
            .register_parsed::<i64>()
            .register_parsed::<i128>()
            .register_parsed::<isize>()
            .register_parsed::<u8>()
            .register_parsed::<u16>()
            .register_parsed::<u32>()
            .register_parsed::<u64>()
            .register_parsed::<u128>()
            .register_parsed::<usize>()
            .register_parsed::<NonZeroU32>()
            .register_parsed::<NonZeroU64>()
            .register_parsed::<NonZeroUsize>()
            .register_parsed::<f32>()
            .register_parsed::<f64>()
            .register_parsed::<IpAddr>()
            .register_parsed::<Ipv4Addr>()
            .register_parsed::<Ipv6Addr>()
            .register_parsed::<SocketAddr>();

        registry
    }

    /// A registry with no converters at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Register a conversion function for `T`, replacing any existing one
    pub fn register<T, E, F>(&mut self, convert: F) -> &mut Self
    where
        T: Send + 'static,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let convert: Arc<ConvertFn> = Arc::new(move |raw: &str| {
            convert(raw)
                .map(|value| Box::new(value) as Value)
                .map_err(|err| err.to_string())
        });

        let value_type = ValueType::of::<T>();
        self.converters
            .insert(value_type.id(), Converter::new(value_type, convert));

        self
    }

    /// Register `T`'s [`FromStr`] implementation as its converter
    pub fn register_parsed<T>(&mut self) -> &mut Self
    where
        T: FromStr + Send + 'static,
        T::Err: Display,
    {
        self.register(T::from_str)
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&Converter> {
        self.converters.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: TypeId) -> bool {
        self.converters.contains_key(&id)
    }
}

impl Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.converters.values().map(|c| c.value_type().name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert<T: Copy + 'static>(registry: &ConverterRegistry, raw: &str) -> Result<T, String> {
        let converter = registry.get(TypeId::of::<T>()).expect("registered");
        converter
            .convert(raw)
            .map(|value| *value.downcast::<T>().expect("correct type"))
    }

    #[test]
    fn builtin_numbers() {
        let registry = ConverterRegistry::new();

        assert_eq!(convert::<u16>(&registry, "8080"), Ok(8080));
        assert_eq!(convert::<i32>(&registry, "-5"), Ok(-5));
        assert_eq!(convert::<f64>(&registry, "2.5"), Ok(2.5));
        assert!(convert::<u8>(&registry, "256").is_err());
    }

    #[test]
    fn bools_ignore_case() {
        let registry = ConverterRegistry::new();

        assert_eq!(convert::<bool>(&registry, "TRUE"), Ok(true));
        assert_eq!(convert::<bool>(&registry, "False"), Ok(false));
        assert_eq!(
            convert::<bool>(&registry, "yes"),
            Err("expected `true` or `false`".to_owned())
        );
    }

    #[test]
    fn strings_and_paths() {
        let registry = ConverterRegistry::new();

        let value = registry
            .get(TypeId::of::<String>())
            .unwrap()
            .convert("(secret)")
            .unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "(secret)");

        let value = registry
            .get(TypeId::of::<PathBuf>())
            .unwrap()
            .convert("./var/logs")
            .unwrap();
        assert_eq!(
            value.downcast_ref::<PathBuf>().unwrap(),
            &PathBuf::from("./var/logs")
        );
    }

    #[test]
    fn custom_registration_replaces() {
        let mut registry = ConverterRegistry::empty();
        assert!(!registry.contains(TypeId::of::<u8>()));

        registry.register(|raw: &str| match raw {
            "one" => Ok(1u8),
            _ => Err("only `one` is supported"),
        });

        assert_eq!(convert::<u8>(&registry, "one"), Ok(1));
        assert_eq!(
            convert::<u8>(&registry, "1"),
            Err("only `one` is supported".to_owned())
        );
    }
}
