//! The seven control directives carried by object keys.
//!
//! Each directive is one variant of a tagged enum; [`parse`] recognizes a key
//! by its leading verb after the `@djson ` marker and extracts the params.
//! Verbs are disjoint by construction, so recognition order never matters.

use crate::arith;
use crate::condition;
use crate::context::{Bind, Context};
use crate::engine::Engine;
use crate::value::{as_f64, render, resolve, strip_quotes, truthy};
use serde_json::Value;

pub use crate::functions::MARKER;

/// Keys recognized inside a `match`/`switch` subtree.
pub const CASE_PREFIX: &str = "@djson case";
pub const DEFAULT_KEY: &str = "@djson default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    If { condition: String, key: Option<String> },
    Unless { condition: String, key: Option<String> },
    Else,
    Exists { path: String, key: Option<String> },
    For { collection: String, var: String },
    Match { expression: String },
    Set { var: String, expression: String },
}

/// Parse a directive key. `None` means the key is not a (well-formed)
/// directive; the walker then treats it as a literal key and the validator
/// reports it if it still carries the marker.
pub fn parse(key: &str) -> Option<Directive> {
    let body = key.strip_prefix(MARKER)?.trim();
    let (verb, rest) = match body.find(char::is_whitespace) {
        Some(at) => (&body[..at], body[at..].trim()),
        None => (body, ""),
    };
    match verb {
        "if" if !rest.is_empty() => {
            let (condition, key) = split_as_clause(rest);
            Some(Directive::If {
                condition: condition.to_string(),
                key: key.map(str::to_string),
            })
        }
        "unless" if !rest.is_empty() => {
            let (condition, key) = split_as_clause(rest);
            Some(Directive::Unless {
                condition: condition.to_string(),
                key: key.map(str::to_string),
            })
        }
        "else" if rest.is_empty() => Some(Directive::Else),
        "exists" if !rest.is_empty() => {
            let (path, key) = split_as_clause(rest);
            Some(Directive::Exists {
                path: path.to_string(),
                key: key.map(str::to_string),
            })
        }
        "for" => {
            // the `as <id>` clause is mandatory here
            let (collection, var) = split_as_clause(rest);
            Some(Directive::For {
                collection: collection.to_string(),
                var: var?.to_string(),
            })
        }
        "match" | "switch" if !rest.is_empty() => Some(Directive::Match {
            expression: rest.to_string(),
        }),
        "set" => {
            let (var, expression) = rest.split_once('=')?;
            let (var, expression) = (var.trim(), expression.trim());
            if !is_identifier(var) || expression.is_empty() {
                return None;
            }
            Some(Directive::Set {
                var: var.to_string(),
                expression: expression.to_string(),
            })
        }
        _ => None,
    }
}

/// Split a trailing ` as <identifier>` clause off an expression. The last
/// such clause wins, so conditions may themselves contain the word "as"
/// inside quoted text.
fn split_as_clause(rest: &str) -> (&str, Option<&str>) {
    if let Some(at) = rest.rfind(" as ") {
        let head = rest[..at].trim();
        let tail = rest[at + 4..].trim();
        if is_identifier(tail) && !head.is_empty() {
            return (head, Some(tail));
        }
    }
    (rest, None)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Directive {
    /// Execute against the subtree value. `None` is the omit sentinel: the
    /// directive contributes nothing to the enclosing structure.
    ///
    /// The Else gate (did the preceding conditional omit?) lives in the
    /// walker; by the time `execute` runs on an Else the gate has passed.
    pub fn execute(&self, value: &Value, ctx: &Context, engine: &Engine) -> Option<Value> {
        match self {
            Directive::If { condition, key } => {
                if condition::evaluate(condition, ctx) {
                    keyed_subtree(key.as_deref(), value, ctx, engine)
                } else {
                    None
                }
            }
            Directive::Unless { condition, key } => {
                if !condition::evaluate(condition, ctx) {
                    keyed_subtree(key.as_deref(), value, ctx, engine)
                } else {
                    None
                }
            }
            Directive::Else => engine.process_node(value, ctx),
            Directive::Exists { path, key } => {
                if truthy(&resolve(path, ctx)) {
                    keyed_subtree(key.as_deref(), value, ctx, engine)
                } else {
                    None
                }
            }
            Directive::For { collection, var } => Some(execute_for(
                collection, var, value, ctx, engine,
            )),
            Directive::Match { expression } => execute_match(expression, value, ctx, engine),
            Directive::Set { var, expression } => {
                let computed = arith::evaluate(expression, ctx);
                let child = ctx.with_bind(var, Bind::Value(computed));
                engine.process_node(value, &child)
            }
        }
    }
}

/// Shared tail of If/Unless/Exists: process the subtree, wrapping a
/// non-container result under the `as <id>` name when one was given.
fn keyed_subtree(
    key: Option<&str>,
    value: &Value,
    ctx: &Context,
    engine: &Engine,
) -> Option<Value> {
    let is_container = matches!(value, Value::Object(_) | Value::Array(_));
    let processed = engine.process_node(value, ctx)?;
    match key {
        Some(k) if !is_container => {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(k.to_string(), processed);
            Some(Value::Object(wrapped))
        }
        _ => Some(processed),
    }
}

/// Iterate a list or map, processing the subtree once per element in an
/// overlay context carrying the loop variable and `_index`/`_key`/`_first`/
/// `_last`. Elements whose body omits are dropped. A non-collection source
/// yields an empty list.
fn execute_for(
    collection: &str,
    var: &str,
    body: &Value,
    ctx: &Context,
    engine: &Engine,
) -> Value {
    let elements: Vec<(Value, Value)> = match resolve(collection, ctx) {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::from(i), item))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, item)| (Value::String(k), item))
            .collect(),
        _ => return Value::Array(Vec::new()),
    };

    let count = elements.len();
    let mut out = Vec::with_capacity(count);
    for (index, (key, item)) in elements.into_iter().enumerate() {
        let scope = ctx.with_binds([
            (var.to_string(), Bind::Value(item)),
            ("_index".to_string(), Bind::Value(Value::from(index))),
            ("_key".to_string(), Bind::Value(key)),
            ("_first".to_string(), Bind::Value(Value::Bool(index == 0))),
            (
                "_last".to_string(),
                Bind::Value(Value::Bool(index + 1 == count)),
            ),
        ]);
        if let Some(processed) = engine.process_node(body, &scope) {
            out.push(processed);
        }
    }
    Value::Array(out)
}

/// First matching `case` wins; `default` only fires when no case matched.
/// An empty object result is treated as omit, mirroring a branch whose own
/// content entirely omitted itself.
fn execute_match(
    expression: &str,
    value: &Value,
    ctx: &Context,
    engine: &Engine,
) -> Option<Value> {
    let discriminant = resolve(expression, ctx);
    let Value::Object(cases) = value else {
        return None;
    };

    let mut default_branch: Option<&Value> = None;
    let mut taken: Option<&Value> = None;
    for (case_key, case_value) in cases {
        if case_key == DEFAULT_KEY {
            default_branch = Some(case_value);
            continue;
        }
        if let Some(pattern) = case_key.strip_prefix(CASE_PREFIX) {
            if matches_case(&discriminant, pattern.trim()) {
                taken = Some(case_value);
                break;
            }
        }
    }

    let branch = taken.or(default_branch)?;
    let processed = engine.process_node(branch, ctx)?;
    match processed {
        Value::Object(m) if m.is_empty() => None,
        other => Some(other),
    }
}

/// Loose case comparison: quote-stripped pattern text against the resolved
/// discriminant, numerically when both sides read as numbers.
fn matches_case(discriminant: &Value, pattern: &str) -> bool {
    let pattern = strip_quotes(pattern).unwrap_or(pattern);
    if let (Some(dv), Some(pv)) = (as_f64(discriminant), pattern.trim().parse::<f64>().ok()) {
        return (dv - pv).abs() < f64::EPSILON;
    }
    render(discriminant) == pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_conditionals() {
        assert_eq!(
            parse("@djson if user.age >= 18"),
            Some(Directive::If {
                condition: "user.age >= 18".into(),
                key: None
            })
        );
        assert_eq!(
            parse("@djson unless user.banned as note"),
            Some(Directive::Unless {
                condition: "user.banned".into(),
                key: Some("note".into())
            })
        );
        assert_eq!(parse("@djson else"), Some(Directive::Else));
        assert_eq!(parse("@djson else something"), None);
    }

    #[test]
    fn parses_exists_and_for() {
        assert_eq!(
            parse("@djson exists user.email as email"),
            Some(Directive::Exists {
                path: "user.email".into(),
                key: Some("email".into())
            })
        );
        assert_eq!(
            parse("@djson for items as item"),
            Some(Directive::For {
                collection: "items".into(),
                var: "item".into()
            })
        );
        // missing `as` clause is not a for directive
        assert_eq!(parse("@djson for items"), None);
    }

    #[test]
    fn parses_match_and_set() {
        assert_eq!(
            parse("@djson match user.role"),
            Some(Directive::Match {
                expression: "user.role".into()
            })
        );
        assert_eq!(
            parse("@djson switch user.role"),
            Some(Directive::Match {
                expression: "user.role".into()
            })
        );
        assert_eq!(
            parse("@djson set total = price * qty"),
            Some(Directive::Set {
                var: "total".into(),
                expression: "price * qty".into()
            })
        );
        assert_eq!(parse("@djson set = x"), None);
        assert_eq!(parse("@djson set total"), None);
    }

    #[test]
    fn rejects_unknown_verbs() {
        assert_eq!(parse("@djson frobnicate x"), None);
        assert_eq!(parse("@djson "), None);
        assert_eq!(parse("plain key"), None);
        // case/default are match-internal, not free-standing directives
        assert_eq!(parse("@djson case admin"), None);
        assert_eq!(parse("@djson default"), None);
    }

    #[test]
    fn as_clause_takes_the_last_occurrence() {
        assert_eq!(
            parse("@djson if role == \"admin\" as flag"),
            Some(Directive::If {
                condition: "role == \"admin\"".into(),
                key: Some("flag".into())
            })
        );
    }

    #[test]
    fn case_matching_is_loose() {
        assert!(matches_case(&serde_json::json!("admin"), "admin"));
        assert!(matches_case(&serde_json::json!("admin"), "\"admin\""));
        assert!(matches_case(&serde_json::json!(2), "2"));
        assert!(matches_case(&serde_json::json!("2"), "2"));
        assert!(matches_case(&serde_json::json!(true), "true"));
        assert!(!matches_case(&serde_json::json!("admin"), "guest"));
    }
}
