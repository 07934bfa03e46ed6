use crate::context::{Bind, Context};
use serde_json::Value;

/// Resolve a dot-notation path against the context.
///
/// Each segment steps into the current value: object lookup by key, array
/// lookup by numeric segment, or a host-object probe. Any segment that fails
/// (missing key, bad index, wrong container kind, probe miss) short-circuits
/// the whole resolution to null; resolution never fails loudly.
pub fn resolve(path: &str, ctx: &Context) -> Value {
    let path = path.trim();
    if path.is_empty() {
        return Value::Null;
    }
    let mut segments = path.split('.');
    let first = segments.next().unwrap_or_default();
    let mut current = match ctx.get(first) {
        Some(bind) => bind.clone(),
        None => {
            tracing::trace!(path, "unbound identifier");
            return Value::Null;
        }
    };
    for segment in segments {
        current = match step(&current, segment) {
            Some(next) => next,
            None => return Value::Null,
        };
    }
    match current {
        Bind::Value(v) => v,
        // Host objects are opaque; a path ending on one contributes nothing.
        Bind::Object(_) => Value::Null,
    }
}

fn step(current: &Bind, segment: &str) -> Option<Bind> {
    match current {
        Bind::Value(Value::Object(map)) => map.get(segment).cloned().map(Bind::Value),
        Bind::Value(Value::Array(items)) => {
            let idx: usize = segment.parse().ok()?;
            items.get(idx).cloned().map(Bind::Value)
        }
        Bind::Object(obj) => obj.probe(segment),
        _ => None,
    }
}

/// Text form of a value for embedded interpolation.
/// Null renders empty, booleans as `true`/`false`, numbers canonically;
/// containers fall back to compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Truthiness: null, false, numeric zero, the empty string, a string reading
/// as numeric zero (`"0"`), empty array and empty object are falsy;
/// everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => {
            !s.is_empty() && s.trim().parse::<f64>().map_or(true, |f| f != 0.0)
        }
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

/// Numeric coercion used by arithmetic and comparisons. Numbers pass through;
/// numeric-looking strings parse; everything else is non-numeric.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Integer view of a value, used to keep int arithmetic int.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a bare token the way operand positions do: quoted string literal,
/// number, `true`/`false`/`null` keyword, else a dot-path lookup.
pub fn resolve_operand(token: &str, ctx: &Context) -> Value {
    let token = token.trim();
    if let Some(lit) = strip_quotes(token) {
        return Value::String(lit.to_string());
    }
    if let Some(num) = parse_number(token) {
        return num;
    }
    match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => resolve(token, ctx),
    }
}

/// Strip one matching pair of single or double quotes, if present.
pub fn strip_quotes(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}

/// Parse a numeric literal: `.` picks float, otherwise integer.
pub fn parse_number(token: &str) -> Option<Value> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.contains('.') {
        token.parse::<f64>().ok().map(Value::from)
    } else {
        token.parse::<i64>().ok().map(Value::from)
    }
}
