//! Arithmetic and ternary evaluation for `set` right-hand sides and
//! non-path `{{ }}` content.
//!
//! Operators are tried in the fixed order `*`, `/`, `+`, `-`: the left side
//! of a split resolves as a literal or path, the right side re-enters the
//! evaluator. A left side that is itself an expression fails to resolve and
//! the scan falls through to the next operator, which is what gives `a + b * c`
//! its expected grouping. Chains of three or more same-tier operators are
//! therefore right-leaning (`a - b - c` is `a - (b - c)`); existing templates
//! depend on this, so it is kept.
//!
//! Ternary branches resolve as literals or paths only, never as nested
//! arithmetic. Division by zero yields `0`.

use crate::condition;
use crate::context::Context;
use crate::scan;
use crate::value::{as_f64, as_i64, render, resolve_operand};
use serde_json::Value;

pub fn evaluate(expr: &str, ctx: &Context) -> Value {
    let expr = expr.trim();

    // ternary: split on the first top-level `?`, then the first `:` after it
    if let Some(q) = scan::find_top_level(expr, "?") {
        let rest = &expr[q + 1..];
        if let Some(c) = scan::find_top_level(rest, ":") {
            let picked = if condition::evaluate(&expr[..q], ctx) {
                rest[..c].trim()
            } else {
                rest[c + 1..].trim()
            };
            return resolve_operand(picked, ctx);
        }
    }

    if let Some((l, r)) = scan::split_first(expr, "*") {
        let left = resolve_operand(l, ctx);
        let right = evaluate(r, ctx);
        if let Some(product) = numeric_op(&left, &right, i64::checked_mul, |a, b| a * b) {
            return product;
        }
    }

    if let Some((l, r)) = scan::split_first(expr, "/") {
        let left = resolve_operand(l, ctx);
        let right = evaluate(r, ctx);
        return divide(&left, &right);
    }

    if let Some((l, r)) = scan::split_first(expr, "+") {
        let left = resolve_operand(l, ctx);
        let right = evaluate(r, ctx);
        if let Some(sum) = numeric_op(&left, &right, i64::checked_add, |a, b| a + b) {
            return sum;
        }
        // non-numeric `+` concatenates
        return Value::String(format!("{}{}", render(&left), render(&right)));
    }

    if let Some((l, r)) = scan::split_first(expr, "-") {
        let left = resolve_operand(l, ctx);
        let right = evaluate(r, ctx);
        if let Some(diff) = numeric_op(&left, &right, i64::checked_sub, |a, b| a - b) {
            return diff;
        }
    }

    resolve_operand(expr, ctx)
}

/// Apply an operator numerically: integer op when both sides are integral
/// (falling back to float on overflow), float op when either side carries a
/// fractional form, `None` when either side is non-numeric.
fn numeric_op(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Option<Value> {
    let (fl, fr) = (as_f64(left)?, as_f64(right)?);
    if let (Some(il), Some(ir)) = (as_i64(left), as_i64(right)) {
        if let Some(out) = int_op(il, ir) {
            return Some(Value::from(out));
        }
    }
    Some(Value::from(float_op(fl, fr)))
}

/// Division resolves to `0` for a zero divisor or non-numeric operands, and
/// stays integral when the division is exact.
fn divide(left: &Value, right: &Value) -> Value {
    match (as_f64(left), as_f64(right)) {
        (Some(fl), Some(fr)) if fr != 0.0 => {
            if let (Some(il), Some(ir)) = (as_i64(left), as_i64(right)) {
                if il % ir == 0 {
                    return Value::from(il / ir);
                }
            }
            Value::from(fl / fr)
        }
        _ => Value::from(0),
    }
}
