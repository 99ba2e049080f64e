use std::fmt;
use ordered_float::OrderedFloat;
use serde_json::Value;

/// A primitive constant a `literal` schema compares against.
///
/// `Undefined` stands for an absent value (a missing object field).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl Literal {
    /// Strict equality against an observed slot. No coercion: `"1"` never
    /// matches `1`, and `NaN` never matches anything.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Literal::Undefined, None) => true,
            (Literal::Null, Some(Value::Null)) => true,
            (Literal::Bool(a), Some(Value::Bool(b))) => a == b,
            (Literal::Number(a), Some(Value::Number(b))) => b.as_f64() == Some(a.0),
            (Literal::String(a), Some(Value::String(b))) => a == b,
            _ => false,
        }
    }

    /// Scalar JSON values map onto literals; arrays and objects do not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Literal::Null),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => n.as_f64().map(|f| Literal::Number(OrderedFloat(f))),
            Value::String(s) => Some(Literal::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Bare rendering used when listing discriminator values: strings unquoted.
    pub fn bare(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Undefined => f.write_str("undefined"),
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{}", n.0),
            Literal::String(s) => f.write_str(&json_quote(s)),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self { Literal::String(s.to_string()) }
}

impl From<String> for Literal {
    fn from(s: String) -> Self { Literal::String(s) }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self { Literal::Bool(b) }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self { Literal::Number(OrderedFloat(n)) }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self { Literal::Number(OrderedFloat(n as f64)) }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self { Literal::Number(OrderedFloat(n as f64)) }
}

impl From<u32> for Literal {
    fn from(n: u32) -> Self { Literal::Number(OrderedFloat(n as f64)) }
}

/// Short rendering of an observed slot for diagnostics. Composite values are
/// named by shape instead of dumped.
pub fn describe_observed(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Array(_)) => "array".to_string(),
        Some(Value::Object(_)) => "object".to_string(),
        Some(Value::String(s)) => json_quote(s),
        Some(other) => other.to_string(),
    }
}

/// JSON string quoting, so diagnostics escape the way the input was written.
pub fn json_quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// The `typeof` tag of a slot: arrays and null both report `object`.
pub fn type_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => "object",
    }
}
