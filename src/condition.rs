//! Boolean/comparison expressions for `if`, `unless` and ternary conditions.
//!
//! Grammar, lowest to highest precedence:
//! `or := and ('||' and)*`, `and := unary ('&&' unary)*`,
//! `unary := '!' unary | comparison`, `comparison := operand (cmpOp operand)?`.
//! There is no parenthesized grouping.

use crate::context::Context;
use crate::scan;
use crate::value::{as_f64, resolve_operand, truthy};
use serde_json::Value;

pub fn evaluate(expr: &str, ctx: &Context) -> bool {
    let expr = expr.trim();

    let or_parts = scan::split_all(expr, "||");
    if or_parts.len() > 1 {
        return or_parts.iter().any(|part| evaluate(part, ctx));
    }

    let and_parts = scan::split_all(expr, "&&");
    if and_parts.len() > 1 {
        return and_parts.iter().all(|part| evaluate(part, ctx));
    }

    if let Some(rest) = expr.strip_prefix('!') {
        // leading `!` is negation; `!=` belongs to the comparison below
        if !rest.starts_with('=') {
            return !evaluate(rest, ctx);
        }
    }

    if let Some((at, op)) = scan::find_comparison(expr) {
        let left = resolve_operand(&expr[..at], ctx);
        let right = resolve_operand(&expr[at + op.len()..], ctx);
        return compare(&left, op, &right);
    }

    truthy(&resolve_operand(expr, ctx))
}

fn compare(a: &Value, op: &str, b: &Value) -> bool {
    if let (Some(fa), Some(fb)) = (as_f64(a), as_f64(b)) {
        let eq = (fa - fb).abs() < f64::EPSILON;
        return match op {
            "==" => eq,
            "!=" => !eq,
            ">" => fa > fb,
            ">=" => fa > fb || eq,
            "<" => fa < fb,
            "<=" => fa < fb || eq,
            _ => false,
        };
    }
    match op {
        "==" => loose_eq(a, b),
        "!=" => !loose_eq(a, b),
        // ordering is undefined for non-numeric operands
        _ => false,
    }
}

/// Loose equality: identical values match, otherwise the rendered text forms
/// are compared (so `true == "true"` and `null == ""` hold).
fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || crate::value::render(a) == crate::value::render(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context {
        Context::from_data(&json!({
            "user": {"age": 25, "active": true, "name": "Ada", "role": "admin"},
            "count": 0,
            "tags": [],
        }))
    }

    #[test]
    fn comparisons() {
        let c = ctx();
        assert!(evaluate("user.age >= 18", &c));
        assert!(evaluate("user.age > 24", &c));
        assert!(!evaluate("user.age < 25", &c));
        assert!(evaluate("user.age <= 25", &c));
        assert!(evaluate("user.age == 25", &c));
        assert!(evaluate("user.age != 30", &c));
        assert!(evaluate("user.role == \"admin\"", &c));
        assert!(evaluate("user.role != 'guest'", &c));
    }

    #[test]
    fn logical_operators() {
        let c = ctx();
        assert!(evaluate("user.active && user.age >= 18", &c));
        assert!(!evaluate("user.active && count", &c));
        assert!(evaluate("count || user.active", &c));
        assert!(evaluate("count || tags || user.name", &c));
        assert!(evaluate("user.age > 18 && user.age < 30 && user.active", &c));
    }

    #[test]
    fn negation() {
        let c = ctx();
        assert!(evaluate("!count", &c));
        assert!(!evaluate("!user.active", &c));
        assert!(evaluate("!user.missing", &c));
        assert!(evaluate("!count && user.active", &c));
    }

    #[test]
    fn bare_truthiness() {
        let c = ctx();
        assert!(evaluate("user.active", &c));
        assert!(!evaluate("count", &c));
        assert!(!evaluate("tags", &c));
        assert!(!evaluate("user.missing", &c));
        assert!(evaluate("true", &c));
        assert!(!evaluate("false", &c));
        assert!(!evaluate("null", &c));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        let c = Context::from_data(&json!({"n": "10"}));
        assert!(evaluate("n == 10", &c));
        assert!(evaluate("n > 9", &c));
    }

    #[test]
    fn ordering_on_non_numeric_is_false() {
        let c = ctx();
        assert!(!evaluate("user.name > \"A\"", &c));
        assert!(!evaluate("user.name <= \"Z\"", &c));
    }

    #[test]
    fn quoted_operators_are_opaque() {
        let c = ctx();
        assert!(evaluate("user.role == \"admin\" || user.role == \"a&&b\"", &c));
    }
}
