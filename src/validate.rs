//! Validation engine.
//!
//! Walks a schema and a value in lock-step. Every mismatch fails the call
//! immediately, except inside a union, which collects the failures of all
//! its alternatives before deciding what to report (see [`union`]).
mod trail;
pub mod union;

use serde_json::{Map, Value};

use crate::error::{MarshalError, Segment, ValidateError};
use crate::schema::literal::{describe_observed, type_of};
use crate::schema::{Schema, Tag};
use trail::Trail;

/// Root label used when the caller does not name the value.
pub const DEFAULT_NAME: &str = "INPUT";

/// Key whose presence on an object marks a prototype-pollution attempt.
pub const PROTO_KEY: &str = "__proto__";

pub fn validate(value: &Value, schema: &Schema) -> Result<(), ValidateError> {
    validate_at(value, schema, DEFAULT_NAME, &[])
}

/// Validate with a caller-chosen root label and path prefix.
pub fn validate_at(value: &Value, schema: &Schema, name: &str, path: &[Segment]) -> Result<(), ValidateError> {
    validate_slot(Some(value), schema, name, path)
}

/// Like [`validate_at`], for a slot that may be absent (`None` is `undefined`).
pub fn validate_slot(
    value: Option<&Value>,
    schema: &Schema,
    name: &str,
    path: &[Segment],
) -> Result<(), ValidateError> {
    Engine { name }.check(value, schema, &Trail::Root(path))
}

struct Engine<'n> {
    name: &'n str,
}

impl Engine<'_> {
    fn check(&self, value: Option<&Value>, schema: &Schema, trail: &Trail<'_>) -> Result<(), ValidateError> {
        match schema {
            Schema::Any | Schema::Unknown => Ok(()),

            Schema::Literal(lit) => {
                if lit.matches(value) {
                    return Ok(());
                }
                let info = format!("Expected literal {lit}, got {}", describe_observed(value));
                Err(self.fail(trail, Tag::Literal, info))
            }

            Schema::Boolean => self.primitive(value, Tag::Boolean, trail, |v| v.is_boolean()),
            Schema::Number => self.primitive(value, Tag::Number, trail, |v| v.is_number()),
            Schema::String => self.primitive(value, Tag::String, trail, |v| v.is_string()),

            Schema::Optional(inner) => match value {
                None => Ok(()),
                Some(_) => self.check(value, inner, trail),
            },

            Schema::Object(object) => {
                let map = self.expect_object(value, Tag::Object, trail)?;
                for (key, field) in object.checking_order() {
                    self.check(map.get(key), field, &trail.key(key))?;
                }
                // declared fields first, so a field mismatch always wins over excess keys
                if let Some(key) = map.keys().find(|k| !object.contains_key(k)) {
                    return Err(self.fail(trail, Tag::Object, format!("Found unexpected key: {key}")));
                }
                Ok(())
            }

            Schema::Record(inner) => {
                let map = self.expect_object(value, Tag::Record, trail)?;
                for (key, item) in map {
                    self.check(Some(item), inner, &trail.key(key))?;
                }
                Ok(())
            }

            Schema::Array(inner) => {
                let items = self.expect_array(value, Tag::Array, trail)?;
                for (i, item) in items.iter().enumerate() {
                    self.check(Some(item), inner, &trail.index(i))?;
                }
                Ok(())
            }

            Schema::Tuple(positions) => {
                let items = self.expect_array(value, Tag::Tuple, trail)?;
                if items.len() != positions.len() {
                    let info = format!("Invalid tuple size: Expected {}, got {}", positions.len(), items.len());
                    return Err(self.fail(trail, Tag::Tuple, info));
                }
                for (i, (item, position)) in items.iter().zip(positions).enumerate() {
                    self.check(Some(item), position, &trail.index(i))?;
                }
                Ok(())
            }

            Schema::Union(variants) => {
                let mut failures = Vec::with_capacity(variants.len());
                for variant in variants {
                    match self.check(value, variant, trail) {
                        Ok(()) => return Ok(()),
                        Err(ValidateError::Marshal(err)) => failures.push(err),
                        Err(defect) => return Err(defect),
                    }
                }
                Err(union::disambiguate(self.name, value, variants, failures, trail).into())
            }

            Schema::Recursive(rec) => {
                let body = rec.resolve().map_err(|cause| ValidateError::Defect {
                    at: crate::error::render_path(self.name, &trail.to_vec()),
                    cause,
                })?;
                self.check(value, &body, trail)
            }

            Schema::Custom(custom) => {
                self.check(value, custom.inner(), trail)?;
                match custom.run(value) {
                    Ok(None) => Ok(()),
                    Ok(Some(_)) => Err(self.fail(
                        trail,
                        Tag::Custom,
                        "Custom validation function unexpectedly returned a value",
                    )),
                    Err(err) => Err(self.fail(trail, Tag::Custom, err.to_string())),
                }
            }

            Schema::Witness { inner, .. } => self.check(value, inner, trail),
        }
    }

    fn primitive(
        &self,
        value: Option<&Value>,
        tag: Tag,
        trail: &Trail<'_>,
        is: impl Fn(&Value) -> bool,
    ) -> Result<(), ValidateError> {
        match value {
            Some(v) if is(v) => Ok(()),
            _ => Err(self.fail(trail, tag, format!("Expected {tag}, got {}", type_of(value)))),
        }
    }

    /// Object shape plus the prototype-pollution guard, shared by `object`
    /// and `record`.
    fn expect_object<'v>(
        &self,
        value: Option<&'v Value>,
        tag: Tag,
        trail: &Trail<'_>,
    ) -> Result<&'v Map<String, Value>, ValidateError> {
        match value {
            Some(Value::Object(map)) => {
                if map.contains_key(PROTO_KEY) {
                    tracing::debug!(path = %crate::error::render_path(self.name, &trail.to_vec()), "rejected {PROTO_KEY} key");
                    return Err(self.fail(trail, tag, "Encountered prototype pollution"));
                }
                Ok(map)
            }
            Some(Value::Null) => Err(self.fail(trail, tag, "Expected object, got null")),
            Some(Value::Array(_)) => Err(self.fail(trail, tag, "Expected object, got array")),
            other => Err(self.fail(trail, tag, format!("Expected object, got {}", type_of(other)))),
        }
    }

    fn expect_array<'v>(
        &self,
        value: Option<&'v Value>,
        tag: Tag,
        trail: &Trail<'_>,
    ) -> Result<&'v Vec<Value>, ValidateError> {
        match value {
            Some(Value::Array(items)) => Ok(items),
            other => Err(self.fail(trail, tag, format!("Expected {tag}, got {}", type_of(other)))),
        }
    }

    fn fail(&self, trail: &Trail<'_>, rule: Tag, info: impl Into<String>) -> ValidateError {
        MarshalError::new(self.name, trail.to_vec(), info, rule).into()
    }
}

// ------------------------------- Tests ------------------------------------ //
