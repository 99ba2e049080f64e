use std::fmt;
use serde::{Deserialize, Serialize, Serializer};

use crate::schema::Tag;
use crate::schema::recursive::Unlinked;

/// One step from the root to a failure site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, ".{k}"),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for Segment {
    fn from(k: &str) -> Self { Segment::Key(k.to_string()) }
}

impl From<String> for Segment {
    fn from(k: String) -> Self { Segment::Key(k) }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self { Segment::Index(i) }
}

/// `INPUT.items[3].name`
pub fn render_path(name: &str, path: &[Segment]) -> String {
    let mut out = name.to_string();
    for seg in path {
        out.push_str(&seg.to_string());
    }
    out
}

/// A value did not conform to its schema.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("[At {}]: {}", render_path(.name, .path), .info)]
pub struct MarshalError {
    name: String,
    path: Vec<Segment>,
    info: String,
    rule: Tag,
}

impl MarshalError {
    pub fn new(name: impl Into<String>, path: Vec<Segment>, info: impl Into<String>, rule: Tag) -> Self {
        Self { name: name.into(), path, info: info.into(), rule }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn path(&self) -> &[Segment] { &self.path }

    pub fn info(&self) -> &str { &self.info }

    pub fn rule(&self) -> Tag { self.rule }

    /// `[At <name><path>]: <info>`
    pub fn message(&self) -> String { self.to_string() }
}

impl Serialize for MarshalError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Record<'a> {
            name: &'a str,
            path: &'a [Segment],
            info: &'a str,
            rule: Tag,
            message: String,
        }
        Record {
            name: &self.name,
            path: &self.path,
            info: &self.info,
            rule: self.rule,
            message: self.message(),
        }
        .serialize(serializer)
    }
}

/// Outcome of a failed validation call.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    /// The schema itself is broken; not a verdict about the value.
    #[error("schema defect at {at}: {}", .cause.reason())]
    Defect { at: String, cause: Unlinked },
}

impl ValidateError {
    pub fn as_marshal(&self) -> Option<&MarshalError> {
        match self {
            ValidateError::Marshal(err) => Some(err),
            ValidateError::Defect { .. } => None,
        }
    }

    pub fn into_marshal(self) -> Result<MarshalError, Self> {
        match self {
            ValidateError::Marshal(err) => Ok(err),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_renders_keys_and_indices() {
        let err = MarshalError::new(
            "INPUT",
            vec!["items".into(), 3.into(), "name".into()],
            "Expected string, got number",
            Tag::String,
        );
        assert_eq!(err.message(), "[At INPUT.items[3].name]: Expected string, got number");
    }

    #[test]
    fn root_failure_has_bare_name() {
        let err = MarshalError::new("body", Vec::new(), "Expected object, got null", Tag::Object);
        assert_eq!(err.to_string(), "[At body]: Expected object, got null");
    }

    #[test]
    fn serializes_stable_fields() {
        let err = MarshalError::new("INPUT", vec![0.into()], "nope", Tag::Custom);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "name": "INPUT",
                "path": [0],
                "info": "nope",
                "rule": "custom",
                "message": "[At INPUT[0]]: nope",
            })
        );
    }
}
