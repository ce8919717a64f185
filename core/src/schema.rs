//! Declared request schemas and the registry that memoizes them.
//!
//! # Design
//! A request type is a marker implementing `RequestType`, which lists its
//! properties as `(canonical name, TypeDescriptor)` pairs in wire order.
//! `SchemaRegistry` turns that declaration into a `Schema` the first time the
//! type is used and hands out the same `Arc<Schema>` afterwards. Each schema
//! owns its alias index, so a camelCase spelling is derived once per type and
//! then resolved with a single map lookup.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ClientValidationError;
use crate::naming::to_snake_case;

/// Scalar kinds a property can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Integer,
    Float,
    /// Integer or float, decided from the input. Used for prices.
    Numeric,
    String,
    Boolean,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Integer => "integer",
            Primitive::Float => "float",
            Primitive::Numeric => "numeric",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
        }
    }
}

/// A statically declared request object type.
pub trait RequestType: 'static {
    /// Name used in validation messages.
    const NAME: &'static str;

    /// Properties in the order they are serialized.
    fn properties() -> Vec<(&'static str, TypeDescriptor)>;
}

/// Reference to a request type, usable inside a `TypeDescriptor`.
#[derive(Debug, Clone, Copy)]
pub struct ObjectType {
    type_id: TypeId,
    name: &'static str,
    properties: fn() -> Vec<(&'static str, TypeDescriptor)>,
}

impl ObjectType {
    pub fn of<T: RequestType>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
            properties: T::properties,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ObjectType {}

/// Expected shape of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Object(ObjectType),
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub const INTEGER: Self = Self::Primitive(Primitive::Integer);
    pub const FLOAT: Self = Self::Primitive(Primitive::Float);
    pub const NUMERIC: Self = Self::Primitive(Primitive::Numeric);
    pub const STRING: Self = Self::Primitive(Primitive::String);
    pub const BOOLEAN: Self = Self::Primitive(Primitive::Boolean);

    pub fn object<T: RequestType>() -> Self {
        Self::Object(ObjectType::of::<T>())
    }

    pub fn array_of(inner: TypeDescriptor) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Object(o) => f.write_str(o.name),
            Self::Array(_) => f.write_str("array"),
        }
    }
}

/// The resolved, immutable schema of one request type.
#[derive(Debug)]
pub struct Schema {
    object_type: ObjectType,
    properties: Vec<(String, TypeDescriptor)>,
    positions: HashMap<String, usize>,
    aliases: RwLock<HashMap<String, usize>>,
}

impl Schema {
    fn build(object_type: ObjectType) -> Self {
        let properties: Vec<(String, TypeDescriptor)> = (object_type.properties)()
            .into_iter()
            .map(|(name, descriptor)| (name.to_string(), descriptor))
            .collect();
        let positions = properties
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();

        Self {
            object_type,
            properties,
            positions,
            aliases: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.object_type.name
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Declared properties in wire order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.properties.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Resolve any accepted spelling of a property to its canonical name and
    /// declared type.
    pub fn resolve(&self, name: &str) -> Result<(&str, &TypeDescriptor), ClientValidationError> {
        self.position(name)
            .map(|i| {
                let (canonical, descriptor) = &self.properties[i];
                (canonical.as_str(), descriptor)
            })
            .ok_or_else(|| ClientValidationError::unknown(self.name(), name))
    }

    fn position(&self, name: &str) -> Option<usize> {
        if let Some(&i) = self.positions.get(name) {
            return Some(i);
        }
        if let Some(&i) = self.aliases.read().get(name) {
            return Some(i);
        }

        let i = *self.positions.get(&to_snake_case(name))?;
        self.aliases.write().insert(name.to_string(), i);
        Some(i)
    }

    #[cfg(test)]
    fn cached_aliases(&self) -> usize {
        self.aliases.read().len()
    }
}

static GLOBAL: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Read-through cache of schemas keyed by request type identity.
///
/// Entries are built on first use and never invalidated. Two threads racing
/// on the same type may both build it; the first insert wins.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used when none is injected.
    pub fn global() -> Arc<SchemaRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn schema<T: RequestType>(&self) -> Arc<Schema> {
        self.resolve(&ObjectType::of::<T>())
    }

    pub fn resolve(&self, object_type: &ObjectType) -> Arc<Schema> {
        if let Some(schema) = self.schemas.read().get(&object_type.type_id) {
            return Arc::clone(schema);
        }

        let schema = Arc::new(Schema::build(*object_type));
        debug!(schema = object_type.name, "registered request schema");
        Arc::clone(self.schemas.write().entry(object_type.type_id).or_insert(schema))
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listing;

    impl RequestType for Listing {
        const NAME: &'static str = "Listing";

        fn properties() -> Vec<(&'static str, TypeDescriptor)> {
            vec![
                ("max_price", TypeDescriptor::NUMERIC),
                ("estate_id", TypeDescriptor::STRING),
                ("postal_codes", TypeDescriptor::array_of(TypeDescriptor::STRING)),
            ]
        }
    }

    #[test]
    fn registry_memoizes_schemas() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());

        let first = registry.schema::<Listing>();
        let second = registry.schema::<Listing>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn separate_registries_do_not_share_schemas() {
        let a = SchemaRegistry::new().schema::<Listing>();
        let b = SchemaRegistry::new().schema::<Listing>();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn every_spelling_resolves_to_the_canonical_name() {
        let schema = SchemaRegistry::new().schema::<Listing>();
        for name in ["max_price", "maxPrice", "MaxPrice"] {
            let (canonical, descriptor) = schema.resolve(name).unwrap();
            assert_eq!(canonical, "max_price");
            assert_eq!(descriptor, &TypeDescriptor::NUMERIC);
        }
        assert_eq!(schema.resolve("estateID").unwrap().0, "estate_id");
    }

    #[test]
    fn derived_aliases_are_cached_once() {
        let schema = SchemaRegistry::new().schema::<Listing>();
        schema.resolve("max_price").unwrap();
        assert_eq!(schema.cached_aliases(), 0);

        schema.resolve("maxPrice").unwrap();
        schema.resolve("maxPrice").unwrap();
        assert_eq!(schema.cached_aliases(), 1);
    }

    #[test]
    fn unknown_names_fail_and_are_not_cached() {
        let schema = SchemaRegistry::new().schema::<Listing>();
        let err = schema.resolve("minPrice").unwrap_err();
        assert_eq!(err, ClientValidationError::unknown("Listing", "minPrice"));
        assert_eq!(schema.cached_aliases(), 0);
    }

    #[test]
    fn properties_keep_declared_order() {
        let schema = SchemaRegistry::new().schema::<Listing>();
        let names: Vec<&str> = schema.properties().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["max_price", "estate_id", "postal_codes"]);
    }

    #[test]
    fn descriptors_display_their_expected_type() {
        assert_eq!(TypeDescriptor::NUMERIC.to_string(), "numeric");
        assert_eq!(TypeDescriptor::array_of(TypeDescriptor::STRING).to_string(), "array");
        assert_eq!(TypeDescriptor::object::<Listing>().to_string(), "Listing");
    }
}
