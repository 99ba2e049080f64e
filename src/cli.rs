//! Minimal CLI: check documents against a schema, or describe a schema.
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::{json, Value};

use json_marshal::{document, validate_slot, Schema, ValidateError, DEFAULT_NAME};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a declarative schema
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document, exiting non-zero if any fails
    Check(CheckOut),
    /// print a compact description of a schema document
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    ///
    /// A pointer that selects nothing validates an absent value.
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// root label used in error paths
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,

    /// print one JSON record per failure instead of colored lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

/// One validated document: where it came from and what happened.
struct Report {
    source: String,
    outcome: Result<(), ValidateError>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every document of one input file, after NDJSON splitting, jq and pointer selection.
    fn load_documents(&self, source_path: &Path) -> Result<Vec<(String, Option<Value>)>> {
        let source_path_str = source_path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file ({source_path_str})"))?;

        let mut raw = Vec::new();
        if self.ndjson {
            for (i, line) in source.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value = serde_json::from_str::<Value>(line)
                    .with_context(|| format!("failed to parse JSON ({source_path_str}:{})", i + 1))?;
                raw.push((format!("{source_path_str}:{}", i + 1), value));
            }
        } else {
            let value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            raw.push((source_path_str.clone(), value));
        }

        let mut out = Vec::new();
        for (label, value) in raw {
            let selected = match self.jq_expr.as_ref() {
                None => vec![value],
                Some(jq_expr) => crate::jq_exec::apply_filter(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?,
            };
            let many = selected.len() > 1;
            for (i, value) in selected.into_iter().enumerate() {
                let label = if many { format!("{label}#{i}") } else { label.clone() };
                let value = match self.json_pointer.as_deref() {
                    None => Some(value),
                    Some(pointer) => value.pointer(pointer).cloned(),
                };
                out.push((label, value));
            }
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns whether every checked document conformed.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                let schema = load_schema(&target.schema)?;
                let source_paths = resolve_file_path_patterns(&target.input_settings.input)?;
                tracing::debug!(files = source_paths.len(), "checking inputs");

                let reports = source_paths
                    .par_iter()
                    .map(|path| check_file(&target.input_settings, path, &schema, &target.name))
                    .collect::<Result<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>();

                let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
                for report in &reports {
                    if target.json {
                        print_json(report);
                    } else {
                        print_colored(report);
                    }
                }
                if !target.json {
                    let summary = format!("{} checked, {failed} failed", reports.len());
                    if failed == 0 { eprintln!("{}", summary.green()) } else { eprintln!("{}", summary.red()) }
                }
                Ok(failed == 0)
            }
            Command::Describe(target) => {
                let schema = load_schema(&target.schema)?;
                println!("{schema}");
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_schema(path: &Path) -> Result<Schema> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema document ({})", path.display()))?;
    document::from_str(&source)
        .with_context(|| format!("invalid schema document ({})", path.display()))
}

fn check_file(settings: &InputSettings, path: &Path, schema: &Schema, name: &str) -> Result<Vec<Report>> {
    let documents = settings.load_documents(path)?;
    Ok(documents
        .into_iter()
        .map(|(source, value)| Report {
            source,
            outcome: validate_slot(value.as_ref(), schema, name, &[]),
        })
        .collect())
}

fn print_colored(report: &Report) {
    match &report.outcome {
        Ok(()) => println!("{} {}", "✓".green(), report.source),
        Err(err) => println!("{} {}: {}", "✗".red(), report.source.bold(), err),
    }
}

fn print_json(report: &Report) {
    let record = match &report.outcome {
        Ok(()) => return,
        Err(ValidateError::Marshal(err)) => json!({ "source": report.source, "error": err }),
        Err(defect) => json!({ "source": report.source, "defect": defect.to_string() }),
    };
    println!("{record}");
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use pretty_assertions::assert_eq;

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    fn scratch_file(contents: &str) -> PathBuf {
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("json-marshal-cli-{}-{n}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn settings(path: &Path) -> InputSettings {
        InputSettings {
            ndjson: false,
            json_pointer: None,
            jq_expr: None,
            input: vec![path.to_string_lossy().to_string()],
        }
    }

    fn labels(documents: &[(String, Option<Value>)], path: &Path) -> Vec<String> {
        let prefix = path.to_string_lossy().to_string();
        documents.iter().map(|(label, _)| label.replacen(&prefix, "file", 1)).collect()
    }

    #[test]
    fn ndjson_labels_count_lines_and_skip_blanks() {
        let path = scratch_file("{\"id\": 1}\n\n{\"id\": 2}\n");
        let documents = InputSettings { ndjson: true, ..settings(&path) }.load_documents(&path).unwrap();
        assert_eq!(labels(&documents, &path), ["file:1", "file:3"]);
        assert_eq!(documents[1].1, Some(json!({"id": 2})));
    }

    #[test]
    fn ndjson_parse_error_names_the_line() {
        let path = scratch_file("{\"id\": 1}\nnot json\n");
        let err = InputSettings { ndjson: true, ..settings(&path) }.load_documents(&path).unwrap_err();
        assert!(err.to_string().ends_with(":2)"), "{err}");
    }

    #[test]
    fn jq_outputs_are_numbered_when_there_are_several() {
        let path = scratch_file(r#"[{"id": 1}, {"id": 2}]"#);
        let jq = InputSettings { jq_expr: Some(".[]".to_string()), ..settings(&path) };
        let documents = jq.load_documents(&path).unwrap();
        assert_eq!(labels(&documents, &path), ["file#0", "file#1"]);
        assert_eq!(documents[0].1, Some(json!({"id": 1})));

        let single = InputSettings { jq_expr: Some(".[0]".to_string()), ..settings(&path) };
        assert_eq!(labels(&single.load_documents(&path).unwrap(), &path), ["file"]);
    }

    #[test]
    fn missed_pointer_checks_an_absent_value() {
        let path = scratch_file(r#"{"data": {"id": 1}}"#);
        let hit = InputSettings { json_pointer: Some("/data".to_string()), ..settings(&path) };
        assert_eq!(hit.load_documents(&path).unwrap()[0].1, Some(json!({"id": 1})));

        let miss = InputSettings { json_pointer: Some("/nope".to_string()), ..settings(&path) };
        assert_eq!(miss.load_documents(&path).unwrap()[0].1, None);

        let schema = document::from_value(json!({ "type": "object", "fields": {} })).unwrap();
        let reports = check_file(&miss, &path, &schema, DEFAULT_NAME).unwrap();
        let err = reports[0].outcome.as_ref().unwrap_err();
        assert_eq!(err.to_string(), "[At INPUT]: Expected object, got undefined");
    }

    #[test]
    fn check_file_reports_every_document() {
        let path = scratch_file("{\"id\": 1}\n{\"id\": \"x\"}\n");
        let schema = document::from_value(json!({
            "type": "object",
            "fields": { "id": { "type": "number" } }
        }))
        .unwrap();
        let ndjson = InputSettings { ndjson: true, ..settings(&path) };
        let reports = check_file(&ndjson, &path, &schema, "doc").unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].outcome.is_ok());
        assert_eq!(
            reports[1].outcome.as_ref().unwrap_err().to_string(),
            "[At doc.id]: Expected number, got string"
        );
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let pattern = std::env::temp_dir().join("json-marshal-cli-no-such-*.json");
        let err = resolve_file_path_patterns([pattern.to_string_lossy()]).unwrap_err();
        assert!(err.to_string().starts_with("glob pattern matched no files"), "{err}");

        let literal = resolve_file_path_patterns(["plain.json"]).unwrap();
        assert_eq!(literal, [PathBuf::from("plain.json")]);
    }

    #[test]
    fn run_reports_failures_through_its_result() {
        let schema = scratch_file(r#"{ "type": "object", "fields": { "id": { "type": "number" } } }"#);
        let good = scratch_file(r#"{"id": 1}"#);
        let bad = scratch_file(r#"{"id": "1"}"#);
        let check = |input: &Path| {
            CommandLineInterface::try_parse_from([
                OsStr::new("json-marshal"),
                OsStr::new("check"),
                OsStr::new("--json"),
                OsStr::new("-s"),
                schema.as_os_str(),
                OsStr::new("-i"),
                input.as_os_str(),
            ])
            .unwrap()
            .run()
            .unwrap()
        };
        assert!(check(&good));
        assert!(!check(&bad));

        let describe = CommandLineInterface::try_parse_from([
            OsStr::new("json-marshal"),
            OsStr::new("describe"),
            OsStr::new("-s"),
            schema.as_os_str(),
        ])
        .unwrap();
        assert!(describe.run().unwrap());
    }

    #[test]
    fn broken_schema_document_is_an_error_not_a_failure() {
        let schema = scratch_file(r#"{ "type": "union", "variants": [] }"#);
        let err = load_schema(&schema).unwrap_err();
        assert!(err.to_string().starts_with("invalid schema document"), "{err}");
    }
}
