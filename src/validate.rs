/*!
Validation of converted values. Validators run after conversion, against the
typed value; they can be attached to a single [`Symbol`][crate::Symbol] or
registered for every symbol of a type in a [`ValidatorRegistry`].
*/

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt::Display,
    marker::PhantomData,
    ops::RangeInclusive,
    path::PathBuf,
    sync::Arc,
};

use regex::Regex;

/// Check a converted value, returning a message describing the problem if it
/// isn't acceptable.
pub trait Validate: Send + Sync {
    fn validate(&self, value: &(dyn Any + Send)) -> Result<(), String>;
}

/// A [`Validate`] implementation for a closure over a concrete type
pub struct Rule<T, F> {
    check: F,
    phantom: PhantomData<fn(&T)>,
}

impl<T, F> Rule<T, F> {
    #[inline]
    #[must_use]
    pub fn new(check: F) -> Self {
        Self {
            check,
            phantom: PhantomData,
        }
    }
}

impl<T, F> Validate for Rule<T, F>
where
    T: 'static,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &(dyn Any + Send)) -> Result<(), String> {
        match value.downcast_ref::<T>() {
            Some(value) => (self.check)(value),
            None => Err(format!("expected a {}", type_name::<T>())),
        }
    }
}

/// Create a validator from a closure
#[inline]
#[must_use]
pub fn rule<T, F>(check: F) -> Rule<T, F>
where
    T: 'static,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    Rule::new(check)
}

/// The value must fall within an inclusive range
#[must_use]
pub fn range<T>(bounds: RangeInclusive<T>) -> impl Validate
where
    T: PartialOrd + Display + Send + Sync + 'static,
{
    rule(move |value: &T| match bounds.contains(value) {
        true => Ok(()),
        false => Err(format!(
            "must be between {} and {}",
            bounds.start(),
            bounds.end()
        )),
    })
}

/// The string must not be empty or entirely whitespace
#[must_use]
pub fn not_empty() -> impl Validate {
    rule(|value: &String| match value.trim().is_empty() {
        true => Err("must not be empty".to_owned()),
        false => Ok(()),
    })
}

/// The string must be one of a fixed set of choices
#[must_use]
pub fn one_of(choices: &'static [&'static str]) -> impl Validate {
    rule(move |value: &String| match choices.contains(&value.as_str()) {
        true => Ok(()),
        false => Err(format!("must be one of: {}", choices.join(", "))),
    })
}

/// The string must match a regular expression
#[must_use]
pub fn matches(pattern: Regex) -> impl Validate {
    rule(move |value: &String| match pattern.is_match(value) {
        true => Ok(()),
        false => Err(format!("must match `{}`", pattern.as_str())),
    })
}

/// The path must exist
#[must_use]
pub fn existing_path() -> impl Validate {
    rule(|value: &PathBuf| match value.exists() {
        true => Ok(()),
        false => Err(format!("{} doesn't exist", value.display())),
    })
}

/// Validators applied to every symbol of a given value type
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeId, Vec<Arc<dyn Validate>>>,
}

impl ValidatorRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static>(&mut self, validator: impl Validate + 'static) -> &mut Self {
        self.validators
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Arc::new(validator));

        self
    }

    #[must_use]
    pub fn for_type(&self, id: TypeId) -> &[Arc<dyn Validate>] {
        self.validators.get(&id).map(Vec::as_slice).unwrap_or_default()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("types", &self.validators.len())
            .finish()
    }
}
