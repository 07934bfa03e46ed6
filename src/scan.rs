//! Quote-aware scanning over raw expression text.
//!
//! Both expression sub-languages split on top-level operator occurrences,
//! never inside single- or double-quoted substrings. A quote preceded by a
//! backslash does not terminate the quoted region.

/// Byte index of the first top-level occurrence of `op`.
pub fn find_top_level(expr: &str, op: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let op_bytes = op.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' || c == b'\'' {
            let escaped = i > 0 && bytes[i - 1] == b'\\';
            if !escaped {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
            }
            i += 1;
            continue;
        }
        if quote.is_none() && bytes[i..].starts_with(op_bytes) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Split once on the first top-level `op`, trimming both sides.
pub fn split_first<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let at = find_top_level(expr, op)?;
    Some((expr[..at].trim(), expr[at + op.len()..].trim()))
}

/// Split on every top-level occurrence of `op`, trimming each part.
pub fn split_all<'a>(expr: &'a str, op: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = expr;
    while let Some(at) = find_top_level(rest, op) {
        parts.push(rest[..at].trim());
        rest = &rest[at + op.len()..];
    }
    parts.push(rest.trim());
    parts
}

/// Comparison operators, two-character forms first so `>=` is never read
/// as `>` followed by garbage.
const COMPARISONS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];

/// Locate the first top-level comparison operator in `expr`.
pub fn find_comparison(expr: &str) -> Option<(usize, &'static str)> {
    let mut best: Option<(usize, &'static str)> = None;
    for op in COMPARISONS {
        if let Some(at) = find_top_level(expr, op) {
            let better = match best {
                Some((b, _)) => at < b,
                None => true,
            };
            if better {
                best = Some((at, op));
            }
        }
    }
    best
}

/// Split `expr` into whitespace-separated tokens, keeping quoted substrings
/// (and `{{ }}` interpolation markers) intact.
pub fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    let mut brace_depth = 0usize;
    for c in expr.chars() {
        match c {
            '"' | '\'' if prev != '\\' => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
                current.push(c);
            }
            '{' if quote.is_none() => {
                brace_depth += 1;
                current.push(c);
            }
            '}' if quote.is_none() => {
                brace_depth = brace_depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && quote.is_none() && brace_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
        prev = c;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
