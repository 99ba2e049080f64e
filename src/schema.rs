//! Schema model.
//!
//! A `Schema` is an immutable description of what valid data looks like,
//! built once (see [`build`], re-exported as `crate::m`) and shared by any
//! number of validation calls. Cycles are only possible through
//! [`Schema::Recursive`].
pub mod build;
pub mod literal;
pub mod recursive;

use std::fmt;
use std::sync::Arc;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use literal::json_quote;
pub use literal::Literal;
pub use recursive::Recursive;

/// Field name that marks a literal-valued field as a union discriminator.
pub const KIND: &str = "kind";

#[derive(Clone, Debug)]
pub enum Schema {
    Literal(Literal),
    Boolean,
    Number,
    String,
    Optional(Box<Schema>),
    Object(ObjectSchema),
    Array(Box<Schema>),
    Tuple(Vec<Schema>),
    Union(Vec<Schema>),
    Recursive(Recursive),
    Any,
    Unknown,
    Custom(Custom),
    Record(Box<Schema>),
    Witness { brand: String, inner: Box<Schema> },
}

/// Variant tag. Doubles as the `rule` of a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Literal,
    Boolean,
    Number,
    String,
    Optional,
    Object,
    Array,
    Tuple,
    Union,
    Recursive,
    Any,
    Unknown,
    Custom,
    Record,
    Witness,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Literal => "literal",
            Tag::Boolean => "boolean",
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Optional => "optional",
            Tag::Object => "object",
            Tag::Array => "array",
            Tag::Tuple => "tuple",
            Tag::Union => "union",
            Tag::Recursive => "recursive",
            Tag::Any => "any",
            Tag::Unknown => "unknown",
            Tag::Custom => "custom",
            Tag::Record => "record",
            Tag::Witness => "witness",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Schema {
    pub fn tag(&self) -> Tag {
        match self {
            Schema::Literal(_) => Tag::Literal,
            Schema::Boolean => Tag::Boolean,
            Schema::Number => Tag::Number,
            Schema::String => Tag::String,
            Schema::Optional(_) => Tag::Optional,
            Schema::Object(_) => Tag::Object,
            Schema::Array(_) => Tag::Array,
            Schema::Tuple(_) => Tag::Tuple,
            Schema::Union(_) => Tag::Union,
            Schema::Recursive(_) => Tag::Recursive,
            Schema::Any => Tag::Any,
            Schema::Unknown => Tag::Unknown,
            Schema::Custom(_) => Tag::Custom,
            Schema::Record(_) => Tag::Record,
            Schema::Witness { .. } => Tag::Witness,
        }
    }

    /// Validate `value` with the default root name.
    pub fn validate(&self, value: &Value) -> Result<(), crate::ValidateError> {
        crate::validate::validate(value, self)
    }
}

// ------------------------------- Object ---------------------------------- //

/// Declared fields of an `object` schema, plus the order they are checked in.
///
/// Checking order only decides which failure gets reported first: a literal
/// `kind` field goes first, other literals next, everything else last.
#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, Schema>,
    order: Vec<usize>,
}

impl ObjectSchema {
    pub fn new(fields: IndexMap<String, Schema>) -> Self {
        let mut order: Vec<usize> = (0..fields.len()).collect();
        // stable: declaration order survives within a weight
        order.sort_by_key(|&i| {
            fields.get_index(i).map_or(1, |(name, schema)| field_weight(name, schema))
        });
        Self { fields, order }
    }

    pub fn fields(&self) -> &IndexMap<String, Schema> { &self.fields }

    pub fn get(&self, key: &str) -> Option<&Schema> { self.fields.get(key) }

    pub fn contains_key(&self, key: &str) -> bool { self.fields.contains_key(key) }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Fields in checking order.
    pub fn checking_order(&self) -> impl Iterator<Item = (&str, &Schema)> + '_ {
        self.order.iter().filter_map(move |&i| {
            self.fields.get_index(i).map(|(k, v)| (k.as_str(), v))
        })
    }

    /// The literal payload of a `kind` field, if this object is a
    /// discriminated union branch.
    pub fn discriminator(&self) -> Option<&Literal> {
        match self.fields.get(KIND) {
            Some(Schema::Literal(lit)) => Some(lit),
            _ => None,
        }
    }
}

fn field_weight(name: &str, schema: &Schema) -> i8 {
    match schema {
        Schema::Literal(_) if name == KIND => -1,
        Schema::Literal(_) => 0,
        _ => 1,
    }
}

impl<K: Into<String>> FromIterator<(K, Schema)> for ObjectSchema {
    fn from_iter<I: IntoIterator<Item = (K, Schema)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ------------------------------- Custom ---------------------------------- //

/// Check function of a `custom` schema. `Ok(None)` means accepted; an error
/// carries the rejection message; `Ok(Some(_))` is a misbehaving check.
pub type CheckFn = dyn Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync;

#[derive(Clone)]
pub struct Custom {
    inner: Box<Schema>,
    check: Arc<CheckFn>,
}

impl Custom {
    pub fn new<F>(inner: Schema, check: F) -> Self
    where
        F: Fn(Option<&Value>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self { inner: Box::new(inner), check: Arc::new(check) }
    }

    pub fn inner(&self) -> &Schema { &self.inner }

    pub fn run(&self, value: Option<&Value>) -> anyhow::Result<Option<Value>> {
        (self.check)(value)
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("inner", &self.inner).finish_non_exhaustive()
    }
}

// ----------------------------- Description ------------------------------- //

/// Compact TypeScript-flavoured description, e.g. `{ kind: "leaf", value: number }`.
///
/// A back-edge renders as `<self>` when it points at the innermost enclosing
/// recursive schema and `<self^N>` when it points N recursions further out.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(self, f, &mut Vec::new())
    }
}

/// `owners` holds the identities of the recursive schemas being described,
/// innermost last.
fn describe(schema: &Schema, f: &mut fmt::Formatter<'_>, owners: &mut Vec<usize>) -> fmt::Result {
    match schema {
        Schema::Literal(lit) => write!(f, "{lit}"),
        Schema::Boolean => f.write_str("boolean"),
        Schema::Number => f.write_str("number"),
        Schema::String => f.write_str("string"),
        Schema::Any => f.write_str("any"),
        Schema::Unknown => f.write_str("unknown"),
        Schema::Optional(inner) => {
            describe(inner, f, owners)?;
            f.write_str(" | undefined")
        }
        Schema::Object(object) => {
            if object.is_empty() {
                return f.write_str("{}");
            }
            f.write_str("{ ")?;
            for (i, (name, field)) in object.fields().iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                match field {
                    Schema::Optional(inner) => {
                        write!(f, "{name}?: ")?;
                        describe(inner, f, owners)?;
                    }
                    other => {
                        write!(f, "{name}: ")?;
                        describe(other, f, owners)?;
                    }
                }
            }
            f.write_str(" }")
        }
        Schema::Array(inner) => {
            if needs_parens(inner) {
                f.write_str("(")?;
                describe(inner, f, owners)?;
                f.write_str(")[]")
            } else {
                describe(inner, f, owners)?;
                f.write_str("[]")
            }
        }
        Schema::Tuple(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                describe(item, f, owners)?;
            }
            f.write_str("]")
        }
        Schema::Union(variants) => {
            for (i, variant) in variants.iter().enumerate() {
                if i > 0 { f.write_str(" | ")?; }
                describe(variant, f, owners)?;
            }
            Ok(())
        }
        Schema::Recursive(rec) if rec.is_back_reference() => {
            match owners.iter().rev().position(|&id| id == rec.identity()) {
                Some(0) => f.write_str("<self>"),
                Some(depth) => write!(f, "<self^{depth}>"),
                None => f.write_str("<recursive>"),
            }
        }
        Schema::Recursive(rec) => match rec.resolve() {
            Ok(body) => {
                owners.push(rec.identity());
                let out = describe(&body, f, owners);
                owners.pop();
                out
            }
            Err(_) => f.write_str("<unlinked>"),
        },
        Schema::Custom(custom) => describe(custom.inner(), f, owners),
        Schema::Record(inner) => {
            f.write_str("Record<string, ")?;
            describe(inner, f, owners)?;
            f.write_str(">")
        }
        Schema::Witness { brand, inner } => {
            f.write_str("Branded<")?;
            describe(inner, f, owners)?;
            write!(f, ", {}>", json_quote(brand))
        }
    }
}

fn needs_parens(schema: &Schema) -> bool {
    match schema {
        Schema::Union(_) | Schema::Optional(_) => true,
        Schema::Custom(custom) => needs_parens(custom.inner()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::m;

    #[test]
    fn kind_literal_checked_first_then_literals_then_rest() {
        let object = ObjectSchema::from_iter([
            ("payload", m::arr(m::num())),
            ("version", m::lit(2)),
            ("name", m::string()),
            ("kind", m::lit("event")),
        ]);
        let order: Vec<&str> = object.checking_order().map(|(k, _)| k).collect();
        assert_eq!(order, ["kind", "version", "payload", "name"]);
    }

    #[test]
    fn kind_without_literal_is_not_a_discriminator() {
        let object = ObjectSchema::from_iter([("kind", m::string())]);
        assert!(object.discriminator().is_none());
        let object = ObjectSchema::from_iter([("kind", m::lit("a"))]);
        assert_eq!(object.discriminator(), Some(&Literal::from("a")));
    }

    #[test]
    fn describes_nested_shapes() {
        let schema = m::obj([
            ("kind", m::lit("point")),
            ("tags", m::arr(m::union([m::string(), m::num()]))),
            ("label", m::opt(m::string())),
            ("at", m::tup([m::num(), m::num()])),
        ]);
        assert_eq!(
            schema.to_string(),
            r#"{ kind: "point", tags: (string | number)[], label?: string, at: [number, number] }"#
        );
    }

    #[test]
    fn describes_recursive_back_edges() {
        let list = m::rec(|this| m::obj([("head", m::num()), ("tail", m::opt(this))]));
        assert_eq!(list.to_string(), "{ head: number, tail?: <self> }");
    }

    #[test]
    fn nested_recursions_number_their_back_edges() {
        let outer = m::rec(|outer| m::obj([
            ("a", m::rec(|inner| m::obj([
                ("o", m::opt(outer)),
                ("i", m::opt(inner)),
            ]))),
        ]));
        assert_eq!(outer.to_string(), "{ a: { o?: <self^1>, i?: <self> } }");
    }

    #[test]
    fn detached_back_edge_renders_as_recursive() {
        let mut leaked = None;
        let _owner = m::rec(|this| {
            leaked = Some(this.clone());
            m::arr(this)
        });
        assert_eq!(leaked.map(|s| s.to_string()).as_deref(), Some("<recursive>"));
    }

    #[test]
    fn witness_brand_is_json_quoted() {
        assert_eq!(m::witness("User\"Id", m::string()).to_string(), r#"Branded<string, "User\"Id">"#);
    }

    #[test]
    fn tags_render_lowercase() {
        assert_eq!(m::record(m::any()).tag().to_string(), "record");
        assert_eq!(m::witness("UserId", m::string()).tag(), Tag::Witness);
        assert_eq!(serde_json::to_value(Tag::Custom).unwrap(), "custom");
    }
}
