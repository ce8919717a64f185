//! Response objects parsed from API JSON.
//!
//! # Design
//! Responses have no declared schema: the valid property names of a
//! `ResponseObject` are exactly the keys present in the JSON it was parsed
//! from. Lookups still accept camelCase for snake_case keys, and every
//! spelling that resolves is remembered in a per-instance alias index.
//! Parsing happens once, recursively, and turns strict ISO-8601 timestamps
//! into `DateTime` values.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ClientValidationError;
use crate::naming::to_snake_case;
use crate::properties::{self, Properties};

const TYPE_NAME: &str = "ResponseObject";

// Calendar-valid dates only (leap years included), `T` separator, optional
// fractional seconds, `Z` or a `±HH:MM` offset.
static ISO_8601: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:[1-9][0-9]{3}-(?:(?:0[1-9]|1[0-2])-(?:0[1-9]|1[0-9]|2[0-8])|(?:0[13-9]|1[0-2])-(?:29|30)|(?:0[13578]|1[02])-31)",
        r"|(?:[1-9][0-9](?:0[48]|[2468][048]|[13579][26])|(?:[2468][048]|[13579][26])00)-02-29)",
        r"T(?:[01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](?:\.[0-9]{1,9})?(?:Z|[+-][01][0-9]:[0-5][0-9])$",
    ))
    .expect("ISO-8601 regex should compile")
});

/// Parse `s` as a date-time if it is a strict ISO-8601 timestamp.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if !ISO_8601.is_match(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s).ok()
}

/// A value inside a parsed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// A timestamp together with the text it was parsed from, which is what
    /// serialization writes back.
    DateTime {
        value: DateTime<FixedOffset>,
        source: String,
    },
    Object(ResponseObject),
    List(Vec<ResponseValue>),
}

impl ResponseValue {
    /// Parse a JSON tree: objects become `ResponseObject`s, arrays become
    /// lists, ISO-8601 strings become date-times.
    pub fn parse(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ResponseValue::Null,
            serde_json::Value::Bool(b) => ResponseValue::Bool(b),
            serde_json::Value::Number(n) => ResponseValue::Number(n),
            serde_json::Value::String(s) => match parse_datetime(&s) {
                Some(value) => ResponseValue::DateTime { value, source: s },
                None => ResponseValue::String(s),
            },
            serde_json::Value::Array(items) => {
                ResponseValue::List(items.into_iter().map(ResponseValue::parse).collect())
            }
            serde_json::Value::Object(map) => ResponseValue::Object(ResponseObject::from_map(map)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ResponseValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResponseValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ResponseValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ResponseValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            ResponseValue::DateTime { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ResponseObject> {
        match self {
            ResponseValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ResponseValue]> {
        match self {
            ResponseValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ResponseValue::Null => serde_json::Value::Null,
            ResponseValue::Bool(b) => serde_json::Value::Bool(*b),
            ResponseValue::Number(n) => serde_json::Value::Number(n.clone()),
            ResponseValue::String(s) => serde_json::Value::String(s.clone()),
            ResponseValue::DateTime { source, .. } => serde_json::Value::String(source.clone()),
            ResponseValue::Object(o) => o.to_json(),
            ResponseValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ResponseValue::to_json).collect())
            }
        }
    }
}

impl From<serde_json::Value> for ResponseValue {
    fn from(value: serde_json::Value) -> Self {
        ResponseValue::parse(value)
    }
}

impl From<&str> for ResponseValue {
    fn from(s: &str) -> Self {
        ResponseValue::String(s.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(s: String) -> Self {
        ResponseValue::String(s)
    }
}

impl From<DateTime<FixedOffset>> for ResponseValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        ResponseValue::DateTime {
            source: value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            value,
        }
    }
}

impl Serialize for ResponseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseValue::Null => serializer.serialize_unit(),
            ResponseValue::Bool(b) => serializer.serialize_bool(*b),
            ResponseValue::Number(n) => n.serialize(serializer),
            ResponseValue::String(s) => serializer.serialize_str(s),
            ResponseValue::DateTime { source, .. } => serializer.serialize_str(source),
            ResponseValue::Object(o) => o.serialize(serializer),
            ResponseValue::List(items) => serializer.collect_seq(items),
        }
    }
}

/// An object from a parsed API response.
pub struct ResponseObject {
    /// Keys of the source data, in source order. Removed keys stay here so
    /// they remain addressable.
    keys: Vec<String>,
    data: HashMap<String, ResponseValue>,
    /// Every spelling resolved so far, mapped to its index in `keys`.
    index: RwLock<HashMap<String, usize>>,
}

impl ResponseObject {
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut keys = Vec::with_capacity(map.len());
        let mut data = HashMap::with_capacity(map.len());
        for (key, value) in map {
            data.insert(key.clone(), ResponseValue::parse(value));
            keys.push(key);
        }
        let index = keys.iter().enumerate().map(|(i, k)| (k.clone(), i)).collect();

        Self {
            keys,
            data,
            index: RwLock::new(index),
        }
    }

    /// Parse a JSON document that must be an object.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(Self::from_map(map)),
            _ => None,
        }
    }

    /// Keys of the source data that currently hold a value, in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|k| self.data.contains_key(k.as_str()))
            .map(String::as_str)
    }

    fn resolve(&self, name: &str) -> Result<&str, ClientValidationError> {
        self.position(name)
            .map(|i| self.keys[i].as_str())
            .ok_or_else(|| ClientValidationError::unknown(TYPE_NAME, name))
    }

    fn position(&self, name: &str) -> Option<usize> {
        if let Some(&i) = self.index.read().get(name) {
            return Some(i);
        }

        let derived = to_snake_case(name);
        let i = *self.index.read().get(&derived)?;
        self.index.write().insert(name.to_string(), i);
        Some(i)
    }
}

impl Properties for ResponseObject {
    type Value = ResponseValue;
    type Input = ResponseValue;

    /// JSON null reads as unset.
    fn get(&self, name: &str) -> Result<Option<&ResponseValue>, ClientValidationError> {
        let key = self.resolve(name)?;
        Ok(self.data.get(key).filter(|v| !v.is_null()))
    }

    fn set(&mut self, name: &str, value: impl Into<Self::Input>) -> Result<(), ClientValidationError> {
        let key = self.resolve(name)?.to_string();
        self.data.insert(key, value.into());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<Option<ResponseValue>, ClientValidationError> {
        let key = self.resolve(name)?.to_string();
        Ok(self.data.remove(&key))
    }

    fn has(&self, name: &str) -> bool {
        self.get(name).is_ok_and(|v| v.is_some())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.keys()
                .filter_map(|k| self.data.get(k).map(|v| (k.to_string(), v.to_json())))
                .collect(),
        )
    }
}

impl Serialize for ResponseObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for key in self.keys() {
            if let Some(value) = self.data.get(key) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl Clone for ResponseObject {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            data: self.data.clone(),
            index: RwLock::new(self.index.read().clone()),
        }
    }
}

impl PartialEq for ResponseObject {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.data == other.data
    }
}

impl fmt::Debug for ResponseObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        properties::debug_properties(TYPE_NAME, self, f)
    }
}
