//! Reference comparators for JSON records
//!
//! Both return a total order over `serde_json::Value`, which is what the
//! merge step needs from any comparator it is given.

use serde_json::Value;
use std::cmp::Ordering;

/// Numeric ascending order
///
/// Numbers compare by value, and integers compare exactly at any size
/// serde_json keeps them in (`i64`/`u64`). Strings holding numeric-looking text (`"155"`,
/// `" -3.5 "`) are read as numbers first. Anything without a numeric reading
/// sorts after every number and falls back to [`compare_string`] among its
/// own kind.
pub fn compare_numeric(a: &Value, b: &Value) -> Ordering {
    match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.compare(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_string(a, b),
    }
}

/// Lexicographic order with locale-style collation
///
/// Letters compare case-insensitively first; when two strings differ only in
/// case, the first lowercase/uppercase difference decides, lowercase first.
/// Non-string values compare through their JSON text.
pub fn compare_string(a: &Value, b: &Value) -> Ordering {
    let a = text_key(a);
    let b = text_key(b);

    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }

    // Same letters ignoring case: lowercase sorts before uppercase
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            return match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            };
        }
    }

    a.len().cmp(&b.len())
}

/// Numeric reading of a record; integers stay exact
#[derive(Debug, Clone, Copy)]
enum NumericKey {
    Int(i128),
    Float(f64),
}

impl NumericKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (NumericKey::Int(x), NumericKey::Int(y)) => x.cmp(&y),
            (NumericKey::Float(x), NumericKey::Float(y)) => {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (NumericKey::Int(x), NumericKey::Float(y)) => compare_int_float(x, y),
            (NumericKey::Float(x), NumericKey::Int(y)) => compare_int_float(y, x).reverse(),
        }
    }
}

// Bounds of the integer range serde_json represents exactly
const INT_UPPER: f64 = 18_446_744_073_709_551_616.0; // 2^64
const INT_LOWER: f64 = -9_223_372_036_854_775_808.0; // -2^63

fn compare_int_float(int: i128, float: f64) -> Ordering {
    if float.is_nan() {
        return Ordering::Equal;
    }
    if float >= INT_UPPER {
        return Ordering::Less;
    }
    if float < INT_LOWER {
        return Ordering::Greater;
    }

    // integral f64 values in this range convert to i128 exactly
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64
            .partial_cmp(&(float - whole))
            .unwrap_or(Ordering::Equal),
        other => other,
    }
}

fn numeric_key(value: &Value) -> Option<NumericKey> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(NumericKey::Int)
            .or_else(|| n.as_f64().map(NumericKey::Float)),
        Value::String(s) => parse_numeric(s.trim()),
        _ => None,
    }
}

fn parse_numeric(text: &str) -> Option<NumericKey> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(NumericKey::Int(n.into()));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Some(NumericKey::Int(n.into()));
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(NumericKey::Float)
}

fn text_key(value: &Value) -> std::borrow::Cow<'_, str> {
    match value {
        Value::String(s) => s.as_str().into(),
        other => other.to_string().into(),
    }
}
