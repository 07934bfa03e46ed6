use crate::context::Context;
use crate::scan;
use crate::value::{as_f64, as_i64, parse_number, render, resolve, strip_quotes, truthy};
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

mod datetime;

/// Marker that opens both directive keys and function-call strings.
pub const MARKER: &str = "@djson ";

/// Trait for pluggable transform functions.
///
/// A pipeline stage receives the running value plus the trailing parameters
/// shared by every stage of the chain. Failures raised by host-registered
/// functions propagate unmodified; built-ins never fail.
pub trait Function: Send + Sync {
    fn name(&self) -> &str;
    fn call(&self, value: Value, params: &[Value]) -> Value;
}

/// Adapter so plain closures can be registered, mirroring how the built-in
/// catalog is declared.
pub struct NamedFn {
    name: String,
    f: Box<dyn Fn(Value, &[Value]) -> Value + Send + Sync>,
}

impl NamedFn {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Function for NamedFn {
    fn name(&self) -> &str {
        &self.name
    }
    fn call(&self, value: Value, params: &[Value]) -> Value {
        (self.f)(value, params)
    }
}

/// Function registry. Built once per processor, append-only afterwards;
/// later registrations shadow earlier ones, so hosts may override built-ins.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<String, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        builtins::install(&mut reg);
        reg
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(f.name().to_string(), Arc::new(f));
    }

    pub fn register_fn(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    ) {
        self.register(NamedFn::new(name, f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }
}

/// Does this scalar carry function-call syntax?
pub fn is_call(s: &str) -> bool {
    s.starts_with(MARKER)
}

/// The pipe-delimited function-name chain of a call string, whether or not
/// any argument text follows it. `None` when the first word is not
/// chain-shaped.
pub fn call_chain(expr: &str) -> Option<&str> {
    let body = expr.strip_prefix(MARKER)?;
    let end = body.find(char::is_whitespace).unwrap_or(body.len());
    let chain = &body[..end];
    if chain.is_empty()
        || !chain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '|')
    {
        return None;
    }
    Some(chain)
}

/// Split a call string into its pipe-delimited chain and argument text.
/// Returns `None` when the text after the marker has no chain/argument shape.
pub fn split_call(expr: &str) -> Option<(&str, &str)> {
    let chain = call_chain(expr)?;
    let body = expr.strip_prefix(MARKER)?;
    let rest = body[chain.len()..].trim_start();
    if rest.is_empty() {
        return None;
    }
    Some((chain, rest))
}

/// Apply a `@djson fn|fn2 <arg> [param ...]` string against the context.
///
/// The primary argument is the first `{{path}}` marker in the argument text
/// (resolved as a dot-path), else the first token as a quoted literal,
/// number, or bare word. Remaining tokens become the trailing parameters
/// passed to every stage. Unknown chain segments are skipped at runtime;
/// the validator is what reports them.
pub fn apply(expr: &str, ctx: &Context, registry: &Registry) -> Value {
    let Some((chain, rest)) = split_call(expr) else {
        // degenerate call text renders as-is, minus the marker
        return Value::String(expr.strip_prefix(MARKER).unwrap_or(expr).to_string());
    };

    let tokens = scan::tokenize(rest);
    let mut primary: Option<Value> = None;
    let mut params: Vec<Value> = Vec::new();

    for token in &tokens {
        if let Some(inner) = interpolation_path(token) {
            // only the first marker is the argument; params are literal-only
            if primary.is_none() {
                primary = Some(resolve(inner, ctx));
            }
            continue;
        }
        params.push(parse_param(token));
    }
    let value = primary.unwrap_or_else(|| {
        if params.is_empty() {
            Value::Null
        } else {
            params.remove(0)
        }
    });

    let mut result = value;
    for name in chain.split('|') {
        let name = name.trim();
        if let Some(f) = registry.get(name) {
            result = f.call(result, &params);
        } else {
            tracing::debug!(name, "skipping unregistered function");
        }
    }
    result
}

/// The path inside a token that is exactly one `{{ ... }}` marker.
fn interpolation_path(token: &str) -> Option<&str> {
    let inner = token.strip_prefix("{{")?.strip_suffix("}}")?;
    Some(inner.trim())
}

fn parse_param(token: &str) -> Value {
    if let Some(lit) = strip_quotes(token) {
        return Value::String(lit.to_string());
    }
    if let Some(num) = parse_number(token) {
        return num;
    }
    Value::String(token.to_string())
}

fn param_str(params: &[Value], idx: usize, default: &str) -> String {
    params
        .get(idx)
        .map(render)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn param_i64(params: &[Value], idx: usize, default: i64) -> i64 {
    params.get(idx).and_then(as_i64).unwrap_or(default)
}

mod builtins {
    use super::*;

    pub(super) fn install(reg: &mut Registry) {
        string_fns(reg);
        number_fns(reg);
        date_fns(reg);
        collection_fns(reg);
        utility_fns(reg);
    }

    fn string_fns(reg: &mut Registry) {
        reg.register_fn("upper", |v, _| Value::String(render(&v).to_uppercase()));
        reg.register_fn("lower", |v, _| Value::String(render(&v).to_lowercase()));
        reg.register_fn("capitalize", |v, _| {
            let s = render(&v);
            let mut chars = s.chars();
            let out = match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => s,
            };
            Value::String(out)
        });
        reg.register_fn("title", |v, _| {
            let s = render(&v);
            let mut out = String::with_capacity(s.len());
            let mut at_word_start = true;
            for c in s.chars() {
                if at_word_start {
                    out.extend(c.to_uppercase());
                } else {
                    out.push(c);
                }
                at_word_start = c.is_whitespace();
            }
            Value::String(out)
        });
        reg.register_fn("trim", |v, _| Value::String(render(&v).trim().to_string()));
        reg.register_fn("escape", |v, _| {
            let mut out = String::new();
            for c in render(&v).chars() {
                match c {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '"' => out.push_str("&quot;"),
                    '\'' => out.push_str("&#039;"),
                    c => out.push(c),
                }
            }
            Value::String(out)
        });
        reg.register_fn("json_encode", |v, _| {
            Value::String(serde_json::to_string(&v).unwrap_or_default())
        });
        reg.register_fn("slug", |v, _| {
            let lower = render(&v).to_lowercase();
            let mut out = String::with_capacity(lower.len());
            let mut pending_dash = false;
            for c in lower.chars() {
                if c.is_ascii_alphanumeric() {
                    if pending_dash && !out.is_empty() {
                        out.push('-');
                    }
                    pending_dash = false;
                    out.push(c);
                } else {
                    pending_dash = true;
                }
            }
            Value::String(out)
        });
        reg.register_fn("substr", |v, params| {
            let s = render(&v);
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let start = param_i64(params, 0, 0);
            let start = if start < 0 {
                (len + start).max(0)
            } else {
                start.min(len)
            } as usize;
            let take = match params.get(1).and_then(as_i64) {
                Some(n) if n >= 0 => n as usize,
                Some(_) | None => chars.len().saturating_sub(start),
            };
            Value::String(chars.iter().skip(start).take(take).collect())
        });
        reg.register_fn("replace", |v, params| {
            let search = param_str(params, 0, "");
            if search.is_empty() {
                return v;
            }
            let replacement = params.get(1).map(render).unwrap_or_default();
            Value::String(render(&v).replace(&search, &replacement))
        });
    }

    fn number_fns(reg: &mut Registry) {
        reg.register_fn("number_format", |v, params| {
            let f = as_f64(&v).unwrap_or(0.0);
            let decimals = param_i64(params, 0, 0).max(0) as usize;
            let dec_point = param_str(params, 1, ".");
            let thousands_sep = param_str(params, 2, ",");
            Value::String(number_format(f, decimals, &dec_point, &thousands_sep))
        });
        reg.register_fn("round", |v, params| {
            let f = as_f64(&v).unwrap_or(0.0);
            let precision = param_i64(params, 0, 0);
            let factor = 10f64.powi(precision as i32);
            let rounded = (f * factor).round() / factor;
            integral_number(rounded)
        });
        reg.register_fn("ceil", |v, _| {
            integral_number(as_f64(&v).unwrap_or(0.0).ceil())
        });
        reg.register_fn("floor", |v, _| {
            integral_number(as_f64(&v).unwrap_or(0.0).floor())
        });
        reg.register_fn("abs", |v, _| {
            if let Some(i) = as_i64(&v) {
                return Value::from(i.saturating_abs());
            }
            Value::from(as_f64(&v).unwrap_or(0.0).abs())
        });
    }

    fn date_fns(reg: &mut Registry) {
        reg.register_fn("date", |v, params| {
            let format = param_str(params, 0, "Y-m-d H:i:s");
            datetime::date(&v, &format)
        });
        reg.register_fn("strtotime", |v, _| datetime::strtotime(&render(&v)));
    }

    fn collection_fns(reg: &mut Registry) {
        reg.register_fn("count", |v, _| match v {
            Value::Array(a) => Value::from(a.len()),
            Value::Object(m) => Value::from(m.len()),
            _ => Value::from(0),
        });
        reg.register_fn("first", |v, _| match v {
            Value::Array(a) => a.into_iter().next().unwrap_or(Value::Null),
            Value::Object(m) => m.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
            _ => Value::Null,
        });
        reg.register_fn("last", |v, _| match v {
            Value::Array(a) => a.into_iter().next_back().unwrap_or(Value::Null),
            Value::Object(m) => m.into_iter().next_back().map(|(_, v)| v).unwrap_or(Value::Null),
            _ => Value::Null,
        });
        reg.register_fn("join", |v, params| match v {
            Value::Array(a) => {
                let sep = param_str(params, 0, ",");
                Value::String(a.iter().map(render).join(&sep))
            }
            other => other,
        });
        reg.register_fn("sort", |v, _| match v {
            Value::Array(mut a) => {
                a.sort_by(|x, y| match (as_f64(x), as_f64(y)) {
                    (Some(fx), Some(fy)) => {
                        fx.partial_cmp(&fy).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    _ => render(x).cmp(&render(y)),
                });
                Value::Array(a)
            }
            other => other,
        });
        reg.register_fn("unique", |v, _| match v {
            Value::Array(a) => {
                let dedup = a
                    .into_iter()
                    .unique_by(|x| serde_json::to_string(x).unwrap_or_default())
                    .collect::<Vec<_>>();
                Value::Array(dedup)
            }
            other => other,
        });
    }

    fn utility_fns(reg: &mut Registry) {
        reg.register_fn("default", |v, params| {
            if truthy(&v) {
                v
            } else {
                params
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()))
            }
        });
        reg.register_fn("coalesce", |v, params| {
            if truthy(&v) {
                return v;
            }
            params
                .iter()
                .find(|alt| truthy(alt))
                .cloned()
                .unwrap_or(Value::Null)
        });
    }

    /// Keep whole results integral so `round`/`ceil`/`floor` of an int-like
    /// value prints without a fractional part.
    fn integral_number(f: f64) -> Value {
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            Value::from(f as i64)
        } else {
            Value::from(f)
        }
    }

    fn number_format(f: f64, decimals: usize, dec_point: &str, thousands_sep: &str) -> String {
        let negative = f < 0.0;
        let factor = 10f64.powi(decimals as i32);
        let scaled = (f.abs() * factor).round();
        let digits = format!("{scaled:.0}");
        let (int_digits, frac_digits) = if decimals == 0 {
            (digits.as_str(), "")
        } else if digits.len() > decimals {
            digits.split_at(digits.len() - decimals)
        } else {
            ("", digits.as_str())
        };
        let int_digits = if int_digits.is_empty() { "0" } else { int_digits };

        let mut grouped = String::new();
        for (i, c) in int_digits.chars().enumerate() {
            if i > 0 && (int_digits.len() - i) % 3 == 0 {
                grouped.push_str(thousands_sep);
            }
            grouped.push(c);
        }

        let mut out = String::new();
        if negative && scaled != 0.0 {
            out.push('-');
        }
        out.push_str(&grouped);
        if decimals > 0 {
            out.push_str(dec_point);
            out.push_str(&"0".repeat(decimals - frac_digits.len()));
            out.push_str(frac_digits);
        }
        out
    }
}
