//! Framework-neutral request guards: validate one slice of a request before
//! the handler runs.
use std::fmt;
use serde_json::Value;

use crate::error::{MarshalError, ValidateError};
use crate::schema::Schema;
use crate::validate::validate_slot;

/// What a guard needs from a request.
pub trait Request {
    fn body(&self) -> Option<&Value>;
    fn query(&self) -> Option<&Value>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slice {
    Body,
    Query,
}

impl Slice {
    pub fn name(&self) -> &'static str {
        match self {
            Slice::Body => "body",
            Slice::Query => "query",
        }
    }

    fn of<'r, R: Request>(&self, request: &'r R) -> Option<&'r Value> {
        match self {
            Slice::Body => request.body(),
            Slice::Query => request.query(),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Invalid request {slice}: {}", .rejection.message())]
    Rejected { slice: Slice, rejection: MarshalError },
    #[error(transparent)]
    Defect(ValidateError),
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

pub struct Guarded<H> {
    schema: Schema,
    slice: Slice,
    handler: H,
}

pub fn guard_body<H>(schema: Schema, handler: H) -> Guarded<H> {
    Guarded { schema, slice: Slice::Body, handler }
}

pub fn guard_query<H>(schema: Schema, handler: H) -> Guarded<H> {
    Guarded { schema, slice: Slice::Query, handler }
}

impl<H> Guarded<H> {
    pub fn call<R, T>(&self, request: &R) -> Result<T, GuardError>
    where
        R: Request,
        H: Fn(&R) -> anyhow::Result<T>,
    {
        let slice = self.slice;
        validate_slot(slice.of(request), &self.schema, slice.name(), &[]).map_err(|err| {
            match err.into_marshal() {
                Ok(rejection) => GuardError::Rejected { slice, rejection },
                Err(defect) => GuardError::Defect(defect),
            }
        })?;
        Ok((self.handler)(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::m;
    use serde_json::json;

    struct Req {
        body: Option<Value>,
        query: Option<Value>,
    }

    impl Request for Req {
        fn body(&self) -> Option<&Value> { self.body.as_ref() }
        fn query(&self) -> Option<&Value> { self.query.as_ref() }
    }

    fn create_user() -> Guarded<impl Fn(&Req) -> anyhow::Result<String>> {
        guard_body(m::obj([("name", m::string())]), |req: &Req| {
            let name = req.body.as_ref().and_then(|b| b["name"].as_str()).unwrap_or_default();
            if name == "root" {
                anyhow::bail!("reserved name");
            }
            Ok(format!("created {name}"))
        })
    }

    #[test]
    fn valid_body_reaches_handler() {
        let req = Req { body: Some(json!({"name": "ada"})), query: None };
        assert_eq!(create_user().call(&req).unwrap(), "created ada");
    }

    #[test]
    fn invalid_body_is_rewrapped() {
        let req = Req { body: Some(json!({"name": 1})), query: None };
        let err = create_user().call(&req).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request body: [At body.name]: Expected string, got number");
    }

    #[test]
    fn missing_body_is_undefined() {
        let req = Req { body: None, query: None };
        let err = create_user().call(&req).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request body: [At body]: Expected object, got undefined");
    }

    #[test]
    fn handler_errors_pass_through() {
        let req = Req { body: Some(json!({"name": "root"})), query: None };
        let err = create_user().call(&req).unwrap_err();
        assert!(matches!(err, GuardError::Handler(_)));
        assert_eq!(err.to_string(), "reserved name");
    }

    #[test]
    fn query_guard_names_query() {
        let guarded = guard_query(m::record(m::string()), |_: &Req| -> anyhow::Result<()> { Ok(()) });
        let req = Req { body: None, query: Some(json!({"page": 2})) };
        let err = guarded.call(&req).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request query: [At query.page]: Expected string, got number");
    }
}
