use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    fmt::{self, Debug},
    sync::Arc,
};

use crate::{
    errors::ModelError,
    symbol::{Symbol, Value},
};

/**
A type that can be built from the values bound for a command.

A model declares the symbols it needs, and then is assembled from whatever
was bound to those symbols. Usually this is derived with
`#[derive(Model)]`; the derive reads each field's type and attributes to
decide whether it is a switch, an option, or a positional argument.

The unit type is a model with no symbols, for commands that take no input.
*/
pub trait Model: Sized + Send + 'static {
    /// The symbols this model reads from
    fn symbols() -> Vec<Symbol>;

    /// Assemble the model. Values are taken out of `bindings` by name.
    fn build(bindings: &mut Bindings) -> Result<Self, ModelError>;
}

impl Model for () {
    fn symbols() -> Vec<Symbol> {
        Vec::new()
    }

    fn build(_bindings: &mut Bindings) -> Result<Self, ModelError> {
        Ok(())
    }
}

/// Where a bound value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Supplied on the command line or in a response file
    CommandLine,

    /// Produced by the symbol's default
    Default,

    /// Not supplied and no default exists
    Absent,
}

/// The values bound to a single symbol
pub struct Slot {
    origin: Origin,
    values: Vec<Value>,
}

impl Slot {
    pub(crate) fn new(origin: Origin, values: Vec<Value>) -> Self {
        Self { origin, values }
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("origin", &self.origin)
            .field("values", &self.values.len())
            .finish()
    }
}

/**
The converted and validated values for every symbol visible to a command,
keyed by binding name. Every visible symbol has a slot, even if it is empty.
*/
#[derive(Debug, Default)]
pub struct Bindings {
    slots: HashMap<String, Slot>,
}

impl Bindings {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, binding: impl Into<String>, slot: Slot) {
        self.slots.insert(binding.into(), slot);
    }

    #[must_use]
    pub fn contains(&self, binding: &str) -> bool {
        self.slots.contains_key(binding)
    }

    #[must_use]
    pub fn origin(&self, binding: &str) -> Option<Origin> {
        self.slots.get(binding).map(Slot::origin)
    }

    #[must_use]
    pub fn slot(&self, binding: &str) -> Option<&Slot> {
        self.slots.get(binding)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow the first value bound to `binding`
    #[must_use]
    pub fn get<T: 'static>(&self, binding: &str) -> Option<&T> {
        self.slots
            .get(binding)?
            .values
            .first()?
            .downcast_ref::<T>()
    }

    fn slot_mut(&mut self, binding: &str) -> Result<&mut Slot, ModelError> {
        self.slots.get_mut(binding).ok_or_else(|| ModelError::Unbound {
            binding: binding.to_owned(),
        })
    }

    fn downcast<T: 'static>(binding: &str, value: Value) -> Result<T, ModelError> {
        value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| ModelError::TypeMismatch {
                binding: binding.to_owned(),
                expected: type_name::<T>(),
            })
    }

    /// Take the single value bound to `binding`, which must be present.
    pub fn take_required<T: 'static>(&mut self, binding: &str) -> Result<T, ModelError> {
        self.take_optional(binding)?
            .ok_or_else(|| ModelError::MissingValue {
                binding: binding.to_owned(),
            })
    }

    /// Take the value bound to `binding`, if there is one.
    pub fn take_optional<T: 'static>(&mut self, binding: &str) -> Result<Option<T>, ModelError> {
        let slot = self.slot_mut(binding)?;

        match slot.values.is_empty() {
            true => Ok(None),
            false => Self::downcast(binding, slot.values.remove(0)).map(Some),
        }
    }

    /// Take every value bound to `binding`, in command-line order.
    pub fn take_all<T: 'static>(&mut self, binding: &str) -> Result<Vec<T>, ModelError> {
        let slot = self.slot_mut(binding)?;

        slot.values
            .drain(..)
            .map(|value| Self::downcast(binding, value))
            .collect()
    }
}

pub(crate) type BuildFn =
    Arc<dyn Fn(&mut Bindings) -> Result<Value, ModelError> + Send + Sync>;

/// A type-erased [`Model`], attached to an invokable command
#[derive(Clone)]
pub(crate) struct ModelFactory {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub build: BuildFn,
}

impl ModelFactory {
    pub fn of<M: Model>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            build: Arc::new(|bindings| M::build(bindings).map(|model| Box::new(model) as Value)),
        }
    }
}

impl Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelFactory").field(&self.type_name).finish()
    }
}
