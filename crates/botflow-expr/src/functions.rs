use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rand::Rng;
use serde_json::Value;

use crate::coerce::{number_value, to_number, to_text};
use crate::path::lookup;

/// Built-in functions callable from expressions.
pub const ALLOWED_FUNCTIONS: &[&str] = &[
  "upper",
  "lower",
  "toNumber",
  "random",
  "now",
  "format",
  "json.path",
  "jsonPath",
];

/// Dispatch a built-in by name. Unknown names yield the empty string.
pub(crate) fn call(name: &str, args: &[Option<Value>]) -> Option<Value> {
  let arg = |i: usize| args.get(i).and_then(|a| a.as_ref());

  match name {
    "upper" => Some(Value::String(to_text(arg(0)).to_uppercase())),
    "lower" => Some(Value::String(to_text(arg(0)).to_lowercase())),
    "toNumber" => {
      let n = to_number(arg(0));
      if n.is_nan() { None } else { number_value(n) }
    }
    "random" => random(arg(0), arg(1)),
    "now" => Some(Value::String(iso(Utc::now()))),
    "format" => Some(Value::String(format_date(arg(0)))),
    "json.path" | "jsonPath" => json_path(arg(0), arg(1)),
    _ => Some(Value::String(String::new())),
  }
}

/// Uniform draw between the bounds. Integral bounds draw an integer from the
/// inclusive range, otherwise a float from the half-open range. Missing
/// bounds default to `0` and `1`.
fn random(min: Option<&Value>, max: Option<&Value>) -> Option<Value> {
  let lo = min.map_or(0.0, |v| to_number(Some(v)));
  let hi = max.map_or(1.0, |v| to_number(Some(v)));
  if lo.is_nan() || hi.is_nan() || lo.is_infinite() || hi.is_infinite() {
    return None;
  }
  let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };

  let mut rng = rand::rng();
  let integral = min.is_some() && max.is_some() && lo.fract() == 0.0 && hi.fract() == 0.0;
  if integral {
    let n = rng.random_range(lo as i64..=hi as i64);
    return Some(Value::from(n));
  }
  if lo == hi {
    return number_value(lo);
  }
  number_value(rng.random_range(lo..hi))
}

fn iso(instant: DateTime<Utc>) -> String {
  instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a date-like value as ISO-8601.
///
/// Numbers are epoch milliseconds. Strings are read as RFC 3339 or as a
/// plain `YYYY-MM-DD` date. Anything else is returned in its text form.
fn format_date(value: Option<&Value>) -> String {
  let parsed = match value {
    Some(Value::Number(n)) => n
      .as_f64()
      .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
    Some(Value::String(s)) => parse_date(s.trim()),
    _ => None,
  };
  match parsed {
    Some(instant) => iso(instant),
    None => to_text(value),
  }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
  if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
    return Some(instant.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(text, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Dotted lookup into `object`. A string object is parsed as JSON first.
fn json_path(object: Option<&Value>, path: Option<&Value>) -> Option<Value> {
  let parsed;
  let object = match object? {
    Value::String(s) => {
      parsed = serde_json::from_str::<Value>(s).ok()?;
      &parsed
    }
    other => other,
  };
  let path = to_text(path);
  if path.is_empty() {
    return Some(object.clone());
  }
  lookup(object, path.split('.'))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn some(values: &[Value]) -> Vec<Option<Value>> {
    values.iter().cloned().map(Some).collect()
  }

  #[test]
  fn test_case_functions() {
    assert_eq!(call("upper", &some(&[json!("abc")])), Some(json!("ABC")));
    assert_eq!(call("lower", &some(&[json!("ÀB")])), Some(json!("àb")));
    assert_eq!(call("upper", &[]), Some(json!("")));
  }

  #[test]
  fn test_to_number() {
    assert_eq!(call("toNumber", &some(&[json!("12")])), Some(json!(12)));
    assert_eq!(call("toNumber", &some(&[json!("1.5")])), Some(json!(1.5)));
    assert_eq!(call("toNumber", &some(&[json!("nope")])), None);
  }

  #[test]
  fn test_random_stays_in_bounds() {
    for _ in 0..100 {
      let n = call("random", &some(&[json!(5), json!(1)])).unwrap();
      let n = n.as_i64().unwrap();
      assert!((1..=5).contains(&n));
    }
    let f = call("random", &some(&[json!(0.5), json!(1)])).unwrap();
    let f = f.as_f64().unwrap();
    assert!((0.5..1.0).contains(&f));
  }

  #[test]
  fn test_now_is_utc_iso() {
    let Some(Value::String(now)) = call("now", &[]) else {
      panic!("expected string");
    };
    assert!(now.ends_with('Z'));
    assert!(DateTime::parse_from_rfc3339(&now).is_ok());
  }

  #[test]
  fn test_format() {
    assert_eq!(call("format", &some(&[json!(0)])), Some(json!("1970-01-01T00:00:00.000Z")));
    assert_eq!(
      call("format", &some(&[json!("2024-03-01")])),
      Some(json!("2024-03-01T00:00:00.000Z"))
    );
    assert_eq!(
      call("format", &some(&[json!("2024-03-01T12:30:00+02:00")])),
      Some(json!("2024-03-01T10:30:00.000Z"))
    );
    assert_eq!(call("format", &some(&[json!("soon")])), Some(json!("soon")));
  }

  #[test]
  fn test_json_path() {
    let object = json!({ "data": { "items": [{ "name": "x" }] } });
    assert_eq!(
      call("json.path", &some(&[object.clone(), json!("data.items.0.name")])),
      Some(json!("x"))
    );
    assert_eq!(
      call("jsonPath", &some(&[json!(r#"{"a":{"b":2}}"#), json!("a.b")])),
      Some(json!(2))
    );
    assert_eq!(call("jsonPath", &some(&[object, json!("data.nope")])), None);
  }

  #[test]
  fn test_unknown_function_is_empty() {
    assert_eq!(call("explode", &[]), Some(json!("")));
  }
}
