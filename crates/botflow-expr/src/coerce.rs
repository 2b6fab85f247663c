use serde_json::{Number, Value};

/// Text form of a resolved value.
///
/// `undefined` and `null` are empty, integral numbers print without a
/// fraction, arrays and objects print as compact JSON.
pub fn to_text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(Value::Bool(b)) => b.to_string(),
    Some(Value::Number(n)) => number_text(n),
    Some(other) => other.to_string(),
  }
}

fn number_text(n: &Number) -> String {
  if n.is_i64() || n.is_u64() {
    return n.to_string();
  }
  match n.as_f64() {
    Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
    Some(f) => f.to_string(),
    None => n.to_string(),
  }
}

/// Numeric coercion with the semantics of JavaScript's `Number()`.
///
/// `undefined` and objects are NaN, `null` and blank strings are zero,
/// booleans are zero or one.
pub fn to_number(value: Option<&Value>) -> f64 {
  match value {
    None => f64::NAN,
    Some(Value::Null) => 0.0,
    Some(Value::Bool(b)) => f64::from(u8::from(*b)),
    Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
    Some(Value::String(s)) => parse_number_text(s),
    Some(Value::Array(items)) => match items.as_slice() {
      [] => 0.0,
      [only] => parse_number_text(&to_text(Some(only))),
      _ => f64::NAN,
    },
    Some(Value::Object(_)) => f64::NAN,
  }
}

fn parse_number_text(text: &str) -> f64 {
  let text = text.trim();
  if text.is_empty() {
    return 0.0;
  }
  match text {
    "Infinity" | "+Infinity" => return f64::INFINITY,
    "-Infinity" => return f64::NEG_INFINITY,
    _ => {}
  }
  if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
    return u64::from_str_radix(hex, 16)
      .map(|n| n as f64)
      .unwrap_or(f64::NAN);
  }
  // Rust accepts words like "inf" and "nan" that JavaScript rejects.
  if text
    .chars()
    .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
  {
    return f64::NAN;
  }
  text.parse().unwrap_or(f64::NAN)
}

/// A JSON number for `f`, integral when it has no fraction. NaN and
/// infinities have no JSON form.
pub(crate) fn number_value(f: f64) -> Option<Value> {
  if f.fract() == 0.0 && f.abs() < 9.0e15 {
    return Some(Value::Number(Number::from(f as i64)));
  }
  Number::from_f64(f).map(Value::Number)
}

/// Strict equality between two resolved values.
///
/// `undefined` only equals `undefined`, numbers compare by value, and
/// values of different types are never equal.
pub fn strict_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
  match (left, right) {
    (None, None) => true,
    (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
      (Some(a), Some(b)) => a == b,
      _ => false,
    },
    (Some(a), Some(b)) => a == b,
    _ => false,
  }
}
