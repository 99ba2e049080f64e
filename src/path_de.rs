use serde::de::DeserializeOwned;
use serde_json::Value;

/// A deserialization failure located by JSON path.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

impl<E: std::fmt::Display> From<serde_path_to_error::Error<E>> for PathError {
    fn from(err: serde_path_to_error::Error<E>) -> Self {
        let path = err.path().to_string();
        PathError { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

/// Same, from an already-parsed value.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, PathError> {
    Ok(serde_path_to_error::deserialize::<_, T>(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[allow(dead_code)]
        inner: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        n: u8,
    }

    #[test]
    fn error_names_the_failing_path() {
        let err = from_str_with_path::<Outer>(r#"{"inner": [{"n": 1}, {"n": "x"}]}"#).unwrap_err();
        assert_eq!(err.path, "inner[1].n");
    }

    #[test]
    fn works_from_values() {
        let err = from_value_with_path::<Outer>(serde_json::json!({"inner": {}})).unwrap_err();
        assert_eq!(err.path, "inner");
    }
}
