//! The read/write contract shared by request and response objects.

use std::fmt;

use crate::error::ClientValidationError;

/// Flexible-spelling property access over a canonical-key record.
///
/// Any accepted spelling of a name (snake_case or camelCase) addresses the
/// same property. Unknown names fail with `ClientValidationError` on `get`,
/// `set` and `remove`; `has` reports them as absent.
pub trait Properties {
    /// Stored value type.
    type Value;
    /// Raw value accepted by `set`.
    type Input;

    /// Current value, or `None` when the property is unset.
    fn get(&self, name: &str) -> Result<Option<&Self::Value>, ClientValidationError>;

    /// Validate and store a value. On failure the property is left untouched.
    fn set(&mut self, name: &str, value: impl Into<Self::Input>) -> Result<(), ClientValidationError>;

    /// Unset a property, returning the value it held.
    fn remove(&mut self, name: &str) -> Result<Option<Self::Value>, ClientValidationError>;

    fn has(&self, name: &str) -> bool;

    /// Plain JSON view containing only the properties that hold a value.
    fn to_json(&self) -> serde_json::Value;
}

/// Debug output shared by both object variants: the type name and its JSON.
pub(crate) fn debug_properties<P: Properties>(name: &str, object: &P, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{name}({})", object.to_json())
}
