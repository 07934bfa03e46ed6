//! Static, context-free template validation.
//!
//! Reuses the directive parser and the function registry to accumulate every
//! structural defect in one pass; it never stops at the first error. Runtime
//! degradations (unresolved paths, bad operands) are not errors and are not
//! reported here.

use crate::directives::{self, CASE_PREFIX, DEFAULT_KEY};
use crate::errors::ValidationError;
use crate::functions::{self, Registry};
use serde_json::Value;

pub fn validate(template: &Value, registry: &Registry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    walk(template, registry, &mut String::new(), &mut errors);
    errors
}

/// Validate raw template text. Malformed JSON yields a single syntax error.
pub fn validate_str(text: &str, registry: &Registry) -> Vec<ValidationError> {
    match serde_json::from_str::<Value>(text) {
        Ok(tree) => validate(&tree, registry),
        Err(e) => vec![ValidationError::new(
            format!("Invalid JSON syntax: {e}"),
            "",
        )],
    }
}

fn walk(node: &Value, registry: &Registry, path: &mut String, errors: &mut Vec<ValidationError>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                check_key(key, path, errors);
                with_segment(path, key, |path| walk(value, registry, path, errors));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                with_segment(path, &i.to_string(), |path| {
                    walk(item, registry, path, errors)
                });
            }
        }
        Value::String(s) => check_call(s, registry, path, errors),
        _ => {}
    }
}

/// A key carrying the marker must parse as a directive. `case`/`default`
/// keys are match-internal but accepted anywhere, since validation runs
/// without knowing whether the enclosing key was a match.
fn check_key(key: &str, path: &str, errors: &mut Vec<ValidationError>) {
    if !key.starts_with("@djson") {
        return;
    }
    if key == DEFAULT_KEY {
        return;
    }
    if let Some(pattern) = key.strip_prefix(CASE_PREFIX) {
        if !pattern.trim().is_empty() {
            return;
        }
    }
    if directives::parse(key).is_none() {
        errors.push(ValidationError::new(
            format!("Invalid directive: {key}"),
            path,
        ));
    }
}

/// A string value carrying the marker must name only registered functions,
/// checked independently per pipe segment. The chain is checked even when no
/// argument text follows it.
fn check_call(s: &str, registry: &Registry, path: &str, errors: &mut Vec<ValidationError>) {
    if !functions::is_call(s) {
        return;
    }
    let Some(chain) = functions::call_chain(s) else {
        return;
    };
    for name in chain.split('|') {
        let name = name.trim();
        if !name.is_empty() && !registry.contains(name) {
            errors.push(ValidationError::new(
                format!("Unknown function '{name}'"),
                path,
            ));
        }
    }
}

fn with_segment(path: &mut String, segment: &str, f: impl FnOnce(&mut String)) {
    let len = path.len();
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(segment);
    f(path);
    path.truncate(len);
}
