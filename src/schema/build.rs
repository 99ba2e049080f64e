//! Schema factories, re-exported as `crate::m`.
//!
//! ```
//! use json_marshal::m;
//! let shape = m::union([
//!     m::obj([("kind", m::lit("circle")), ("radius", m::num())]),
//!     m::obj([("kind", m::lit("rect")), ("w", m::num()), ("h", m::num())]),
//! ]);
//! assert!(shape.validate(&serde_json::json!({"kind": "circle", "radius": 2})).is_ok());
//! ```
use anyhow::bail;
use regex::Regex;
use serde_json::Value;

use super::literal::json_quote;
use super::{Custom, Literal, ObjectSchema, Recursive, Schema};

pub fn lit(value: impl Into<Literal>) -> Schema { Schema::Literal(value.into()) }

pub fn null() -> Schema { Schema::Literal(Literal::Null) }

pub fn undefined() -> Schema { Schema::Literal(Literal::Undefined) }

pub fn boolean() -> Schema { Schema::Boolean }

pub fn num() -> Schema { Schema::Number }

pub fn string() -> Schema { Schema::String }

pub fn any() -> Schema { Schema::Any }

pub fn unknown() -> Schema { Schema::Unknown }

pub fn opt(inner: Schema) -> Schema { Schema::Optional(Box::new(inner)) }

pub fn obj<K, I>(fields: I) -> Schema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    Schema::Object(fields.into_iter().collect::<ObjectSchema>())
}

pub fn arr(inner: Schema) -> Schema { Schema::Array(Box::new(inner)) }

pub fn tup(items: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Tuple(items.into_iter().collect())
}

/// Alternatives are tried in the given order. Meant for two or more.
pub fn union(variants: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Union(variants.into_iter().collect())
}

/// `inner` or `null`.
pub fn nullable(inner: Schema) -> Schema { union([inner, null()]) }

pub fn record(inner: Schema) -> Schema { Schema::Record(Box::new(inner)) }

/// Static brand over `inner`; validates exactly like `inner`.
pub fn witness(brand: impl Into<String>, inner: Schema) -> Schema {
    Schema::Witness { brand: brand.into(), inner: Box::new(inner) }
}

/// Self-referential schema. `generate` receives a placeholder for the schema
/// being defined:
///
/// ```
/// use json_marshal::m;
/// let tree = m::rec(|tree| m::obj([
///     ("value", m::num()),
///     ("children", m::arr(tree)),
/// ]));
/// ```
pub fn rec(generate: impl FnOnce(Schema) -> Schema) -> Schema {
    Schema::Recursive(Recursive::new(generate))
}

pub fn try_rec<E>(generate: impl FnOnce(Schema) -> Result<Schema, E>) -> Result<Schema, E> {
    Recursive::try_new(generate).map(Schema::Recursive)
}

/// Raw custom schema: the check must return `Ok(None)` to accept.
pub fn custom<F>(inner: Schema, check: F) -> Schema
where
    F: Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
{
    Schema::Custom(Custom::new(inner, check))
}

/// Custom schema whose check cannot return a value.
pub fn check<F>(inner: Schema, check: F) -> Schema
where
    F: Fn(Option<&Value>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    custom(inner, move |value| check(value).map(|()| None))
}

/// String matching `regex` (unanchored unless the pattern anchors itself).
pub fn pattern(regex: Regex) -> Schema {
    check(string(), move |value| {
        let Some(Value::String(s)) = value else { return Ok(()) };
        if !regex.is_match(s) {
            bail!("Expected string matching /{}/, got {}", regex.as_str(), json_quote(s));
        }
        Ok(())
    })
}
