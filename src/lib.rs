//! Structural validation of decoded JSON against declarative schemas.
//!
//! ```
//! use json_marshal::{m, validate};
//! use serde_json::json;
//!
//! let user = m::obj([("id", m::string()), ("age", m::opt(m::num()))]);
//! assert!(validate(&json!({"id": "u1"}), &user).is_ok());
//!
//! let err = validate(&json!({"id": 7}), &user).unwrap_err();
//! assert_eq!(err.to_string(), "[At INPUT.id]: Expected string, got number");
//! ```
pub mod document;
pub mod error;
pub mod guard;
pub mod path_de;
pub mod schema;
pub mod validate;

pub use error::{MarshalError, Segment, ValidateError};
pub use schema::{Literal, Schema, Tag};
pub use schema::build as m;
pub use validate::{validate, validate_at, validate_slot, DEFAULT_NAME};
