//! Schema documents: a JSON encoding of the schema model.
//!
//! ```json
//! { "type": "recursive", "body": {
//!     "type": "object",
//!     "fields": {
//!         "value": { "type": "number" },
//!         "children": { "type": "array", "of": { "type": "self" } }
//!     }
//! } }
//! ```
//!
//! `self` refers to the innermost enclosing `recursive`. Custom checks are
//! code and cannot be written down; `pattern` covers the common case.
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::path_de::{self, PathError};
use crate::schema::{build as m, Literal, Schema};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaDoc {
    Literal {
        /// Absent means `undefined`; `null` means null.
        #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Boolean,
    Number,
    String,
    Optional { of: Box<SchemaDoc> },
    Object { fields: IndexMap<String, SchemaDoc> },
    Array { of: Box<SchemaDoc> },
    Tuple { items: Vec<SchemaDoc> },
    Union { variants: Vec<SchemaDoc> },
    Recursive { body: Box<SchemaDoc> },
    #[serde(rename = "self")]
    SelfRef,
    Any,
    Unknown,
    Record { of: Box<SchemaDoc> },
    Witness { brand: String, of: Box<SchemaDoc> },
    Pattern { regex: String },
}

fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Parse(#[from] PathError),
    #[error("{at}: `self` used outside of any recursive schema")]
    DanglingSelf { at: String },
    #[error("{at}: union needs at least two variants, got {count}")]
    UnionTooSmall { at: String, count: usize },
    #[error("{at}: literal value must be a string, number, boolean or null")]
    NonScalarLiteral { at: String },
    #[error("{at}: invalid regex: {source}")]
    Regex { at: String, source: regex::Error },
}

pub fn from_str(src: &str) -> Result<Schema, DocumentError> {
    let doc: SchemaDoc = path_de::from_str_with_path(src)?;
    doc.to_schema()
}

pub fn from_value(value: Value) -> Result<Schema, DocumentError> {
    let doc: SchemaDoc = path_de::from_value_with_path(value)?;
    doc.to_schema()
}

impl SchemaDoc {
    pub fn to_schema(&self) -> Result<Schema, DocumentError> {
        let schema = lower(self, None, "#")?;
        tracing::debug!(schema = %schema, "loaded schema document");
        Ok(schema)
    }
}

fn lower(doc: &SchemaDoc, this: Option<&Schema>, at: &str) -> Result<Schema, DocumentError> {
    let schema = match doc {
        SchemaDoc::Literal { value: None } => m::undefined(),
        SchemaDoc::Literal { value: Some(value) } => match Literal::from_value(value) {
            Some(lit) => Schema::Literal(lit),
            None => return Err(DocumentError::NonScalarLiteral { at: at.to_string() }),
        },
        SchemaDoc::Boolean => m::boolean(),
        SchemaDoc::Number => m::num(),
        SchemaDoc::String => m::string(),
        SchemaDoc::Any => m::any(),
        SchemaDoc::Unknown => m::unknown(),
        SchemaDoc::Optional { of } => m::opt(lower(of, this, &format!("{at}/of"))?),
        SchemaDoc::Array { of } => m::arr(lower(of, this, &format!("{at}/of"))?),
        SchemaDoc::Record { of } => m::record(lower(of, this, &format!("{at}/of"))?),
        SchemaDoc::Witness { brand, of } => m::witness(brand.clone(), lower(of, this, &format!("{at}/of"))?),
        SchemaDoc::Object { fields } => {
            let mut out = IndexMap::with_capacity(fields.len());
            for (key, field) in fields {
                out.insert(key.clone(), lower(field, this, &format!("{at}/fields/{key}"))?);
            }
            Schema::Object(crate::schema::ObjectSchema::new(out))
        }
        SchemaDoc::Tuple { items } => m::tup(
            items.iter()
                .enumerate()
                .map(|(i, item)| lower(item, this, &format!("{at}/items/{i}")))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        SchemaDoc::Union { variants } => {
            if variants.len() < 2 {
                return Err(DocumentError::UnionTooSmall { at: at.to_string(), count: variants.len() });
            }
            m::union(
                variants.iter()
                    .enumerate()
                    .map(|(i, variant)| lower(variant, this, &format!("{at}/variants/{i}")))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        SchemaDoc::Recursive { body } => {
            m::try_rec(|placeholder| lower(body, Some(&placeholder), &format!("{at}/body")))?
        }
        SchemaDoc::SelfRef => match this {
            Some(placeholder) => placeholder.clone(),
            None => return Err(DocumentError::DanglingSelf { at: at.to_string() }),
        },
        SchemaDoc::Pattern { regex } => {
            let regex = Regex::new(regex).map_err(|source| DocumentError::Regex { at: at.to_string(), source })?;
            m::pattern(regex)
        }
    };
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;

    #[test]
    fn loads_recursive_tree() {
        let schema = from_value(json!({
            "type": "recursive",
            "body": {
                "type": "object",
                "fields": {
                    "value": { "type": "number" },
                    "children": { "type": "array", "of": { "type": "self" } }
                }
            }
        }))
        .unwrap();
        let ok = json!({"value": 1, "children": [{"value": 2, "children": []}]});
        assert!(validate(&ok, &schema).is_ok());
        let bad = json!({"value": 1, "children": [{"value": "2", "children": []}]});
        assert_eq!(
            validate(&bad, &schema).unwrap_err().to_string(),
            "[At INPUT.children[0].value]: Expected number, got string"
        );
    }

    #[test]
    fn literal_distinguishes_null_from_absent() {
        let null = from_value(json!({"type": "literal", "value": null})).unwrap();
        assert!(matches!(null, Schema::Literal(Literal::Null)));
        let undefined = from_value(json!({"type": "literal"})).unwrap();
        assert!(matches!(undefined, Schema::Literal(Literal::Undefined)));
    }

    #[test]
    fn keeps_field_declaration_order() {
        let schema = from_str(r#"{"type": "object", "fields": {
            "b": {"type": "number"}, "a": {"type": "string"}
        }}"#)
        .unwrap();
        assert_eq!(schema.to_string(), "{ b: number, a: string }");
    }

    #[test]
    fn rejects_dangling_self() {
        let err = from_value(json!({"type": "array", "of": {"type": "self"}})).unwrap_err();
        assert_eq!(err.to_string(), "#/of: `self` used outside of any recursive schema");
    }

    #[test]
    fn rejects_small_unions_and_composite_literals() {
        let err = from_value(json!({"type": "union", "variants": [{"type": "number"}]})).unwrap_err();
        assert!(matches!(err, DocumentError::UnionTooSmall { count: 1, .. }));
        let err = from_value(json!({"type": "literal", "value": [1]})).unwrap_err();
        assert!(matches!(err, DocumentError::NonScalarLiteral { .. }));
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        let err = from_str(r#"{"type": "tuple", "items": [{"type": "number"}, {"type": "float"}]}"#).unwrap_err();
        match err {
            DocumentError::Parse(err) => assert!(err.message.contains("float"), "{err}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pattern_checks_strings() {
        let schema = from_value(json!({"type": "pattern", "regex": "^[a-z]+-\\d+$"})).unwrap();
        assert!(validate(&json!("order-12"), &schema).is_ok());
        let err = validate(&json!("Order"), &schema).unwrap_err();
        assert_eq!(err.as_marshal().unwrap().rule(), crate::Tag::Custom);
        assert_eq!(validate(&json!(12), &schema).unwrap_err().as_marshal().unwrap().rule(), crate::Tag::String);

        let err = from_value(json!({"type": "pattern", "regex": "("})).unwrap_err();
        assert!(matches!(err, DocumentError::Regex { .. }));
    }
}
