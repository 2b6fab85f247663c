use serde_json::Value;

use crate::coerce::number_value;

/// Parse `text` as a literal: `true`, `false`, `null`, a single or double
/// quoted string, or a decimal number.
///
/// Returns `None` when the text is not a literal. `undefined` is a literal
/// without a value and is handled by [`is_literal`] and the resolver.
pub fn parse_literal(text: &str) -> Option<Value> {
  let text = text.trim();
  match text {
    "true" => return Some(Value::Bool(true)),
    "false" => return Some(Value::Bool(false)),
    "null" => return Some(Value::Null),
    _ => {}
  }
  if let Some(inner) = unquote(text) {
    return Some(Value::String(inner.to_string()));
  }
  if is_number_text(text) {
    return text.parse::<f64>().ok().and_then(number_value);
  }
  None
}

/// Whether `text` is a literal, including `undefined`.
pub fn is_literal(text: &str) -> bool {
  text.trim() == "undefined" || parse_literal(text).is_some()
}

fn unquote(text: &str) -> Option<&str> {
  let mut chars = text.chars();
  let first = chars.next()?;
  let last = chars.next_back()?;
  if (first == '"' || first == '\'') && first == last {
    Some(&text[1..text.len() - 1])
  } else {
    None
  }
}

/// `-?digits(.digits)?` with an optional exponent.
fn is_number_text(text: &str) -> bool {
  let unsigned = text.strip_prefix('-').unwrap_or(text);
  let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
    Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
    None => (unsigned, None),
  };
  let (whole, fraction) = match mantissa.split_once('.') {
    Some((whole, fraction)) => (whole, Some(fraction)),
    None => (mantissa, None),
  };
  let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

  digits(whole)
    && fraction.is_none_or(digits)
    && exponent.is_none_or(|e| digits(e.strip_prefix(['-', '+']).unwrap_or(e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_keywords_and_strings() {
    assert_eq!(parse_literal("true"), Some(json!(true)));
    assert_eq!(parse_literal(" null "), Some(Value::Null));
    assert_eq!(parse_literal(r#""x""#), Some(json!("x")));
    assert_eq!(parse_literal("'a, b'"), Some(json!("a, b")));
    assert_eq!(parse_literal("\"unterminated"), None);
    assert_eq!(parse_literal("user.name"), None);
  }

  #[test]
  fn test_numbers() {
    assert_eq!(parse_literal("42"), Some(json!(42)));
    assert_eq!(parse_literal("-3.5"), Some(json!(-3.5)));
    assert_eq!(parse_literal("1e3"), Some(json!(1000)));
    assert_eq!(parse_literal("1."), None);
    assert_eq!(parse_literal("12abc"), None);
    assert_eq!(parse_literal("-"), None);
  }

  #[test]
  fn test_undefined_is_literal_without_value() {
    assert_eq!(parse_literal("undefined"), None);
    assert!(is_literal("undefined"));
    assert!(!is_literal("vars.x"));
  }
}
