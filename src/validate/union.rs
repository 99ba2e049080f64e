//! Picking a useful message when no union alternative matched.
//!
//! "None of N alternatives matched" is useless for discriminated unions with
//! many fields. When the alternatives are objects tagged by a literal `kind`
//! field, a failure from inside a branch whose discriminator did match is
//! reported as-is; otherwise the report is about the discriminator itself.
use indexmap::IndexSet;
use serde_json::Value;

use crate::error::MarshalError;
use crate::schema::literal::describe_observed;
use crate::schema::{Literal, Schema, Tag, KIND};
use super::trail::Trail;

/// Valid `kind` values across the alternatives, in declaration order.
pub fn discriminators(variants: &[Schema]) -> IndexSet<&Literal> {
    variants
        .iter()
        .filter_map(|variant| match variant {
            Schema::Object(object) => object.discriminator(),
            _ => None,
        })
        .collect()
}

pub(super) fn disambiguate(
    name: &str,
    value: Option<&Value>,
    variants: &[Schema],
    failures: Vec<MarshalError>,
    trail: &Trail<'_>,
) -> MarshalError {
    let depth = trail.depth();
    let kinds = discriminators(variants);
    tracing::trace!(
        variants = variants.len(),
        discriminated = !kinds.is_empty(),
        "union matched no variant"
    );

    if kinds.is_empty() {
        let tags = variants.iter().map(|v| v.tag().as_str()).collect::<Vec<_>>().join(" | ");
        let info = format!("Failed to match union: value matched none of the variants [{tags}]");
        return MarshalError::new(name, trail.to_vec(), info, Tag::Union);
    }

    // A failure that is not a shallow literal mismatch came from inside a
    // branch whose discriminator matched.
    let mut failures = failures;
    if let Some(i) = failures.iter().position(|err| err.rule() != Tag::Literal || err.path().len() > depth + 1) {
        return failures.swap_remove(i);
    }

    let expected = kinds.iter().map(|k| k.bare()).collect::<Vec<_>>().join(" | ");
    let info = match value {
        Some(Value::Object(map)) if map.contains_key(KIND) => format!(
            "Failed to match union: unrecognized kind discriminator {}, expected one of [{expected}]",
            describe_observed(map.get(KIND)),
        ),
        _ => format!("Failed to match union: unable to find kind discriminator, expected one of [{expected}]"),
    };
    MarshalError::new(name, trail.to_vec(), info, Tag::Union)
}
