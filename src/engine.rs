//! The recursive template walker.
//!
//! `process_node` is a pure function of `(node, context)`: scalars echo
//! through, strings go through function dispatch or interpolation, arrays
//! map element-wise, and objects fold their keys through directive dispatch
//! with the splice/merge rules described on [`Engine::process_node`].

use crate::arith;
use crate::condition;
use crate::context::Context;
use crate::directives::{self, Directive};
use crate::functions::{self, Registry};
use crate::scan;
use crate::value::{render, resolve};
use serde_json::Value;

pub struct Engine<'a> {
    registry: &'a Registry,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Render a parsed template tree against root data. A root that omits
    /// entirely renders as an empty object.
    pub fn process(&self, template: &Value, data: &Value) -> Value {
        let ctx = Context::from_data(data);
        self.process_node(template, &ctx)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }

    /// Process one node. `None` is the omit sentinel; the caller drops the
    /// node instead of keeping a hole.
    ///
    /// Object keys are walked in declared order. A directive returning an
    /// object has its entries spliced into the output at that point (last
    /// write wins on collisions); a match directive returning a scalar
    /// short-circuits the whole object; any other non-object directive
    /// result becomes the object's value only when no literal key produced
    /// output, which is what lets `{"@djson for …": {…}}` stand for the list
    /// it produces. An object left empty because a directive omitted is
    /// itself the omit sentinel, so loop elements whose body omits are
    /// dropped rather than kept as empty-object holes.
    pub fn process_node(&self, node: &Value, ctx: &Context) -> Option<Value> {
        match node {
            Value::String(s) => Some(self.process_string(s, ctx)),
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .filter_map(|item| self.process_node(item, ctx))
                    .collect(),
            )),
            Value::Object(map) => self.process_object(map, ctx),
            scalar => Some(scalar.clone()),
        }
    }

    fn process_object(
        &self,
        map: &serde_json::Map<String, Value>,
        ctx: &Context,
    ) -> Option<Value> {
        let mut out = serde_json::Map::new();
        // result of a directive that could not be spliced (e.g. a for loop's
        // list); used as the object's value when nothing else materialized
        let mut bare_result: Option<Value> = None;
        // Else gate: did the immediately preceding conditional sibling omit?
        let mut prior_omitted = false;
        // Did any directive omit? An empty output with this flag set is an
        // omitted object, not an empty one.
        let mut saw_omit = false;

        for (key, value) in map {
            match directives::parse(key) {
                Some(Directive::Else) => {
                    let gate_open = prior_omitted;
                    prior_omitted = false;
                    if !gate_open {
                        saw_omit = true;
                        continue;
                    }
                    tracing::debug!(key, "executing directive");
                    let result = Directive::Else.execute(value, ctx, self);
                    saw_omit |= result.is_none();
                    merge_result(result, &mut out, &mut bare_result);
                }
                Some(dir) => {
                    tracing::debug!(key, "executing directive");
                    let result = dir.execute(value, ctx, self);
                    prior_omitted = matches!(
                        dir,
                        Directive::If { .. } | Directive::Unless { .. }
                    ) && result.is_none();
                    saw_omit |= result.is_none();
                    if let (Directive::Match { .. }, Some(scalar)) = (&dir, &result) {
                        if !scalar.is_object() && !scalar.is_array() {
                            // match's scalar branch replaces the whole object
                            return Some(scalar.clone());
                        }
                    }
                    merge_result(result, &mut out, &mut bare_result);
                }
                None => {
                    prior_omitted = false;
                    if let Some(processed) = self.process_node(value, ctx) {
                        out.insert(key.clone(), processed);
                    }
                }
            }
        }

        if out.is_empty() {
            if let Some(bare) = bare_result {
                return Some(bare);
            }
            if saw_omit {
                return None;
            }
        }
        Some(Value::Object(out))
    }

    fn process_string(&self, s: &str, ctx: &Context) -> Value {
        if functions::is_call(s) {
            return functions::apply(s, ctx, self.registry);
        }
        interpolate(s, ctx)
    }
}

fn merge_result(
    result: Option<Value>,
    out: &mut serde_json::Map<String, Value>,
    bare_result: &mut Option<Value>,
) {
    match result {
        None => {}
        Some(Value::Object(entries)) => {
            for (k, v) in entries {
                out.insert(k, v);
            }
        }
        Some(other) => *bare_result = Some(other),
    }
}

/// Resolve `{{ … }}` markers in a string. A string that is exactly one
/// marker yields the resolved value with its native type; markers embedded
/// in surrounding text render to text and substitute in place.
fn interpolate(s: &str, ctx: &Context) -> Value {
    let Some(open) = s.find("{{") else {
        return Value::String(s.to_string());
    };
    let Some(close_rel) = s[open..].find("}}") else {
        return Value::String(s.to_string());
    };
    let close = open + close_rel;

    // sole-marker case: native value passthrough
    if open == 0 && close + 2 == s.len() {
        return eval_marker(&s[2..close], ctx);
    }

    let mut result = String::new();
    let mut rest = s;
    loop {
        let Some(open) = rest.find("{{") else {
            result.push_str(rest);
            break;
        };
        let Some(close_rel) = rest[open + 2..].find("}}") else {
            result.push_str(rest);
            break;
        };
        result.push_str(&rest[..open]);
        let inner = &rest[open + 2..open + 2 + close_rel];
        result.push_str(&render(&eval_marker(inner, ctx)));
        rest = &rest[open + 2 + close_rel + 2..];
    }
    Value::String(result)
}

/// Evaluate marker content: a ternary or arithmetic expression, a boolean
/// expression, or a plain dot-path.
fn eval_marker(inner: &str, ctx: &Context) -> Value {
    let inner = inner.trim();

    if let Some(q) = scan::find_top_level(inner, "?") {
        if scan::find_top_level(&inner[q + 1..], ":").is_some() {
            return arith::evaluate(inner, ctx);
        }
    }
    if inner.starts_with('!')
        || scan::find_top_level(inner, "&&").is_some()
        || scan::find_top_level(inner, "||").is_some()
        || scan::find_comparison(inner).is_some()
    {
        return Value::Bool(condition::evaluate(inner, ctx));
    }
    if ["*", "/", "+", "-"]
        .iter()
        .any(|op| scan::find_top_level(inner, op).is_some())
    {
        return arith::evaluate(inner, ctx);
    }
    resolve(inner, ctx)
}
