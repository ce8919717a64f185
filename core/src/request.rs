//! Schema-validated request objects.
//!
//! # Design
//! A `RequestObject` pairs a shared `Schema` with a map of canonical property
//! names to coerced values. Every write goes through name resolution and
//! coercion before anything is stored, so the map only ever holds canonical
//! keys with values of the declared type. Serialization walks the schema, which
//! keeps the wire order stable and skips unset properties.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::coerce::{self, Context};
use crate::error::ClientValidationError;
use crate::properties::{self, Properties};
use crate::schema::{ObjectType, RequestType, Schema, SchemaRegistry};
use crate::value::{Input, Value};

/// A request payload validated against a declared schema.
#[derive(Clone)]
pub struct RequestObject {
    registry: Arc<SchemaRegistry>,
    schema: Arc<Schema>,
    data: HashMap<String, Value>,
}

impl RequestObject {
    /// Empty object of type `T`, using the process-wide schema registry.
    pub fn new<T: RequestType>() -> Self {
        Self::new_in::<T>(&SchemaRegistry::global())
    }

    pub fn new_in<T: RequestType>(registry: &Arc<SchemaRegistry>) -> Self {
        Self::empty(registry, registry.schema::<T>())
    }

    /// Object of type `T` built from raw input.
    ///
    /// A map is applied entry by entry through the write path; an existing
    /// object of type `T` is returned as-is; null yields an empty object.
    pub fn from_input<T: RequestType>(input: impl Into<Input>) -> Result<Self, ClientValidationError> {
        Self::from_input_in::<T>(&SchemaRegistry::global(), input)
    }

    pub fn from_input_in<T: RequestType>(
        registry: &Arc<SchemaRegistry>,
        input: impl Into<Input>,
    ) -> Result<Self, ClientValidationError> {
        match input.into() {
            Input::Null => Ok(Self::new_in::<T>(registry)),
            input => {
                let ctx = Context {
                    registry,
                    type_name: T::NAME,
                    property: "input",
                };
                coerce::coerce_object(&ctx, &ObjectType::of::<T>(), input)
            }
        }
    }

    pub(crate) fn from_entries(
        registry: &Arc<SchemaRegistry>,
        schema: Arc<Schema>,
        entries: Vec<(String, Input)>,
    ) -> Result<Self, ClientValidationError> {
        let mut object = Self::empty(registry, schema);
        for (name, value) in entries {
            object.set(&name, value)?;
        }
        Ok(object)
    }

    fn empty(registry: &Arc<SchemaRegistry>, schema: Arc<Schema>) -> Self {
        Self {
            registry: Arc::clone(registry),
            schema,
            data: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn type_name(&self) -> &'static str {
        self.schema.name()
    }

    /// Whether this object was declared as type `T`.
    pub fn is<T: RequestType>(&self) -> bool {
        self.schema.object_type() == ObjectType::of::<T>()
    }

    /// Number of properties holding a value.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Canonical name/value pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .properties()
            .filter_map(|(name, _)| self.data.get(name).map(|value| (name, value)))
    }
}

impl Properties for RequestObject {
    type Value = Value;
    type Input = Input;

    fn get(&self, name: &str) -> Result<Option<&Value>, ClientValidationError> {
        let (canonical, _) = self.schema.resolve(name)?;
        Ok(self.data.get(canonical))
    }

    fn set(&mut self, name: &str, value: impl Into<Self::Input>) -> Result<(), ClientValidationError> {
        let schema = Arc::clone(&self.schema);
        let (canonical, descriptor) = schema.resolve(name)?;
        let ctx = Context {
            registry: &self.registry,
            type_name: schema.name(),
            property: canonical,
        };

        match coerce::coerce(&ctx, descriptor, value.into())? {
            Some(value) => {
                self.data.insert(canonical.to_string(), value);
            }
            None => {
                self.data.remove(canonical);
            }
        }
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Option<Value>, ClientValidationError> {
        let (canonical, _) = self.schema.resolve(name)?;
        Ok(self.data.remove(canonical))
    }

    fn has(&self, name: &str) -> bool {
        self.schema
            .resolve(name)
            .is_ok_and(|(canonical, _)| self.data.contains_key(canonical))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for RequestObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl PartialEq for RequestObject {
    fn eq(&self, other: &Self) -> bool {
        self.schema.object_type() == other.schema.object_type() && self.data == other.data
    }
}

impl fmt::Debug for RequestObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        properties::debug_properties(self.type_name(), self, f)
    }
}
