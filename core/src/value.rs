//! Raw input values and coerced request values.
//!
//! `Input` is whatever a caller hands to a request object: a loose tree of
//! scalars, lists and key/value maps, or an already built `RequestObject`.
//! `Value` is what a request object stores after coercion.

use serde::ser::{Serialize, Serializer};

use crate::request::RequestObject;

/// A raw, not yet validated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Input>),
    /// Key/value pairs in insertion order.
    Map(Vec<(String, Input)>),
    Object(RequestObject),
}

impl Input {
    /// Build a map input from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Input>,
    {
        Input::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Runtime type name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Input::Null => "null",
            Input::Bool(_) => "boolean",
            Input::Integer(_) => "integer",
            Input::Float(_) => "float",
            Input::String(_) => "string",
            Input::List(_) => "array",
            Input::Map(_) => "map",
            Input::Object(o) => o.type_name(),
        }
    }
}

impl From<bool> for Input {
    fn from(v: bool) -> Self {
        Input::Bool(v)
    }
}

impl From<i64> for Input {
    fn from(v: i64) -> Self {
        Input::Integer(v)
    }
}

impl From<i32> for Input {
    fn from(v: i32) -> Self {
        Input::Integer(i64::from(v))
    }
}

impl From<u32> for Input {
    fn from(v: u32) -> Self {
        Input::Integer(i64::from(v))
    }
}

impl From<f64> for Input {
    fn from(v: f64) -> Self {
        Input::Float(v)
    }
}

impl From<&str> for Input {
    fn from(v: &str) -> Self {
        Input::String(v.to_string())
    }
}

impl From<String> for Input {
    fn from(v: String) -> Self {
        Input::String(v)
    }
}

impl From<RequestObject> for Input {
    fn from(v: RequestObject) -> Self {
        Input::Object(v)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(v: Option<T>) -> Self {
        v.map_or(Input::Null, Into::into)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(v: Vec<T>) -> Self {
        Input::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Input {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Input::Null,
            serde_json::Value::Bool(b) => Input::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Input::Integer(i),
                None => Input::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Input::String(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(map) => Input::map(map),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Input)> for Input {
    fn from_iter<I: IntoIterator<Item = (K, Input)>>(iter: I) -> Self {
        Input::map(iter)
    }
}

/// A coerced value stored in a request object.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A null list element. Properties themselves are never stored as null.
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Object(RequestObject),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats as-is, integers widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RequestObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Object(o) => crate::properties::Properties::to_json(o),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Object(o) => o.serialize(serializer),
            Value::List(items) => serializer.collect_seq(items),
        }
    }
}
