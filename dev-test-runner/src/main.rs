//! Runs `fixtures/*.json` cases through the library.
//!
//! A fixture names a schema document and a list of cases; each case either
//! expects acceptance (`"ok": true`) or an exact rendered error message.
//! A case without `input` validates an absent value.
use std::process::ExitCode;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;

use json_marshal::document::SchemaDoc;
use json_marshal::{validate_slot, DEFAULT_NAME};

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    schema: SchemaDoc,
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    #[serde(default, deserialize_with = "present")]
    input: Option<Value>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn present<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

fn run_fixture(path: &std::path::Path) -> Result<(usize, usize)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    let fixture: Fixture = serde_path_to_error::deserialize(de)
        .with_context(|| format!("malformed fixture {}", path.display()))?;
    let schema = fixture.schema.to_schema()
        .with_context(|| format!("bad schema in fixture {}", path.display()))?;

    let mut passed = 0;
    for (i, case) in fixture.cases.iter().enumerate() {
        let outcome = validate_slot(case.input.as_ref(), &schema, DEFAULT_NAME, &[]);
        let verdict = match (&outcome, case.ok, case.error.as_deref()) {
            (Ok(()), true, _) => Ok(()),
            (Err(err), false, Some(expected)) if err.to_string() == expected => Ok(()),
            (Ok(()), _, expected) => Err(format!("accepted, expected {expected:?}")),
            (Err(err), _, _) => Err(format!("rejected with {:?}", err.to_string())),
        };
        match verdict {
            Ok(()) => passed += 1,
            Err(why) => eprintln!("{} {} case {i}: {why}", "✗".red(), fixture.name.bold()),
        }
    }
    Ok((passed, fixture.cases.len()))
}

fn main() -> ExitCode {
    let pattern = std::env::args().nth(1).unwrap_or_else(|| "fixtures/*.json".to_string());
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("bad pattern {pattern}: {error}");
            return ExitCode::from(2);
        }
    };

    let (mut passed, mut total) = (0, 0);
    for entry in paths {
        let result = entry.map_err(anyhow::Error::from).and_then(|path| run_fixture(&path));
        match result {
            Ok((p, t)) => {
                passed += p;
                total += t;
            }
            Err(error) => {
                eprintln!("{} {error:#}", "error:".red().bold());
                return ExitCode::from(2);
            }
        }
    }

    let summary = format!("{passed}/{total} cases passed");
    if passed == total {
        eprintln!("{}", summary.green());
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", summary.red());
        ExitCode::FAILURE
    }
}
