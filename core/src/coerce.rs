//! Coercion of raw inputs to declared property types.
//!
//! Rules are applied in a fixed order: `null` always means "unset", then the
//! descriptor decides. Arrays are coerced element by element into a fresh
//! list, so one bad element rejects the whole assignment.

use std::sync::Arc;

use crate::error::ClientValidationError;
use crate::request::RequestObject;
use crate::schema::{ObjectType, Primitive, SchemaRegistry, TypeDescriptor};
use crate::value::{Input, Value};

/// Where a value is being assigned, for error reporting and nested lookups.
pub(crate) struct Context<'a> {
    pub registry: &'a Arc<SchemaRegistry>,
    pub type_name: &'a str,
    pub property: &'a str,
}

impl Context<'_> {
    fn invalid(&self, expected: impl ToString, input: &Input) -> ClientValidationError {
        ClientValidationError::invalid_type(self.type_name, self.property, expected, input.type_name())
    }
}

/// Coerce `input` to `descriptor`. `Ok(None)` means the property is unset.
pub(crate) fn coerce(
    ctx: &Context<'_>,
    descriptor: &TypeDescriptor,
    input: Input,
) -> Result<Option<Value>, ClientValidationError> {
    if matches!(input, Input::Null) {
        return Ok(None);
    }

    match descriptor {
        TypeDescriptor::Primitive(primitive) => coerce_primitive(ctx, *primitive, input),
        TypeDescriptor::Object(object_type) => coerce_object(ctx, object_type, input).map(|o| Some(Value::Object(o))),
        TypeDescriptor::Array(inner) => {
            let items = match input {
                Input::List(items) => items,
                other => return Err(ctx.invalid(descriptor, &other)),
            };
            let values = items
                .into_iter()
                .map(|item| coerce(ctx, inner, item).map(|value| value.unwrap_or(Value::Null)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::List(values)))
        }
    }
}

/// Build or accept a nested object of `object_type`.
///
/// Maps construct a new instance through the regular write path; an existing
/// instance is only accepted when it is of exactly the declared type.
pub(crate) fn coerce_object(
    ctx: &Context<'_>,
    object_type: &ObjectType,
    input: Input,
) -> Result<RequestObject, ClientValidationError> {
    match input {
        Input::Map(entries) => RequestObject::from_entries(ctx.registry, ctx.registry.resolve(object_type), entries),
        Input::Object(object) if object.schema().object_type() == *object_type => Ok(object),
        other => Err(ctx.invalid(object_type.name(), &other)),
    }
}

fn coerce_primitive(
    ctx: &Context<'_>,
    primitive: Primitive,
    input: Input,
) -> Result<Option<Value>, ClientValidationError> {
    let invalid = |input: &Input| ctx.invalid(primitive.name(), input);

    let value = match primitive {
        Primitive::Integer => match &input {
            Input::Integer(i) => Value::Integer(*i),
            Input::Float(f) => Value::Integer(truncate(*f)),
            Input::Bool(b) => Value::Integer(i64::from(*b)),
            Input::String(s) => match parse_number(s) {
                Some(Number::Integer(i)) => Value::Integer(i),
                Some(Number::Float(f)) => Value::Integer(truncate(f)),
                None => return Err(invalid(&input)),
            },
            _ => return Err(invalid(&input)),
        },
        Primitive::Float => match &input {
            Input::Integer(i) => Value::Float(*i as f64),
            Input::Float(f) => Value::Float(*f),
            Input::Bool(b) => Value::Float(if *b { 1.0 } else { 0.0 }),
            Input::String(s) => match parse_number(s) {
                Some(Number::Integer(i)) => Value::Float(i as f64),
                Some(Number::Float(f)) => Value::Float(f),
                None => return Err(invalid(&input)),
            },
            _ => return Err(invalid(&input)),
        },
        Primitive::Numeric => match &input {
            Input::Integer(i) => Value::Integer(*i),
            Input::Float(f) => Value::Float(*f),
            Input::Bool(b) => Value::Integer(i64::from(*b)),
            Input::String(s) if s.trim().is_empty() => return Ok(None),
            Input::String(s) => {
                let leading = leading_integer(s);
                if leading.to_string() == *s {
                    Value::Integer(leading)
                } else {
                    match parse_number(s) {
                        Some(Number::Integer(i)) => Value::Float(i as f64),
                        Some(Number::Float(f)) => Value::Float(f),
                        None => return Err(invalid(&input)),
                    }
                }
            }
            _ => return Err(invalid(&input)),
        },
        Primitive::String => match input {
            Input::String(s) => Value::String(s),
            Input::Integer(i) => Value::String(i.to_string()),
            Input::Float(f) => Value::String(f.to_string()),
            Input::Bool(b) => Value::String(if b { "1" } else { "" }.to_string()),
            other => return Err(invalid(&other)),
        },
        Primitive::Boolean => Value::Boolean(is_truthy(&input)),
    };

    Ok(Some(value))
}

enum Number {
    Integer(i64),
    Float(f64),
}

/// Parse a trimmed decimal string. Non-finite results are rejected.
fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Integer(i));
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Number::Float)
}

/// Integer formed by optional leading whitespace, an optional sign and the
/// leading digit run; zero when there are no digits. Saturates on overflow.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

fn truncate(f: f64) -> i64 {
    f.trunc() as i64
}

fn is_truthy(input: &Input) -> bool {
    match input {
        Input::Null => false,
        Input::Bool(b) => *b,
        Input::Integer(i) => *i != 0,
        Input::Float(f) => *f != 0.0,
        Input::String(s) => !(s.is_empty() || s == "0"),
        Input::List(items) => !items.is_empty(),
        Input::Map(entries) => !entries.is_empty(),
        Input::Object(_) => true,
    }
}
