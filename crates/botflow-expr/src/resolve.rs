use std::sync::LazyLock;

use botflow_config::ExecutionContext;
use regex::Regex;
use serde_json::Value;

use crate::functions;
use crate::literal::parse_literal;
use crate::path::{is_path_shaped, resolve_path};
use crate::template::render;

static CALL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)^([\w.]+)\((.*)\)$").expect("call pattern is valid"));

/// Resolve a single operand into a value. `None` is `undefined`.
///
/// Tried in order: literal, built-in function call, nested `{{ }}` template,
/// context path. Text matching none of them is returned unchanged.
pub fn resolve(expr: &str, ctx: &ExecutionContext) -> Option<Value> {
  let expr = expr.trim();

  if expr == "undefined" {
    return None;
  }
  if let Some(value) = parse_literal(expr) {
    return Some(value);
  }

  if let Some((name, args)) = parse_call(expr) {
    let args: Vec<Option<Value>> = args.iter().map(|arg| resolve(arg, ctx)).collect();
    return functions::call(name, &args);
  }

  if expr.contains("{{") {
    let rendered = render(expr, ctx);
    return Some(parse_literal(&rendered).unwrap_or(Value::String(rendered)));
  }

  if is_path_shaped(expr) {
    return resolve_path(expr, ctx);
  }

  Some(Value::String(expr.to_string()))
}

/// Split `name(args...)` into the function name and its raw arguments.
pub fn parse_call(expr: &str) -> Option<(&str, Vec<&str>)> {
  let captures = CALL.captures(expr.trim())?;
  let name = captures.get(1)?.as_str();
  let inner = captures.get(2)?.as_str();
  Some((name, split_args(inner)))
}

/// Split a function argument list on top-level commas.
///
/// Commas inside quotes or nested parentheses do not split. Arguments are
/// trimmed and an empty list has no arguments.
pub fn split_args(inner: &str) -> Vec<&str> {
  if inner.trim().is_empty() {
    return Vec::new();
  }

  let mut args = Vec::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut escaped = false;
  let mut start = 0;

  for (i, c) in inner.char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
      }
      continue;
    }
    match c {
      '"' | '\'' => quote = Some(c),
      '(' => depth += 1,
      ')' => depth = depth.saturating_sub(1),
      ',' if depth == 0 => {
        args.push(inner[start..i].trim());
        start = i + 1;
      }
      _ => {}
    }
  }
  args.push(inner[start..].trim());
  args
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> ExecutionContext {
    serde_json::from_value(json!({
      "user": { "id": "42", "username": "Test" },
      "options": { "count": 3, "name": "world" },
      "memberRoles": ["admin"],
      "variables": { "items": ["a", "b"], "payload": "{\"ok\":true}" }
    }))
    .unwrap()
  }

  #[test]
  fn test_literals_win_over_paths() {
    let ctx = ctx();
    assert_eq!(resolve(r#""user.username""#, &ctx), Some(json!("user.username")));
    assert_eq!(resolve("3", &ctx), Some(json!(3)));
    assert_eq!(resolve("undefined", &ctx), None);
  }

  #[test]
  fn test_paths() {
    let ctx = ctx();
    assert_eq!(resolve("user.username", &ctx), Some(json!("Test")));
    assert_eq!(resolve(" options.count ", &ctx), Some(json!(3)));
    assert_eq!(resolve("vars.items", &ctx), Some(json!(["a", "b"])));
    assert_eq!(resolve("vars.missing", &ctx), None);
    assert_eq!(resolve("Test", &ctx), Some(json!("Test")));
    assert_eq!(resolve("hello there", &ctx), Some(json!("hello there")));
  }

  #[test]
  fn test_function_calls() {
    let ctx = ctx();
    assert_eq!(resolve("upper(user.username)", &ctx), Some(json!("TEST")));
    assert_eq!(resolve("upper('a, b')", &ctx), Some(json!("A, B")));
    assert_eq!(resolve("toNumber('7')", &ctx), Some(json!(7)));
    assert_eq!(resolve("jsonPath(vars.payload, 'ok')", &ctx), Some(json!(true)));
    assert_eq!(resolve("lower(upper(options.name))", &ctx), Some(json!("world")));
    assert_eq!(resolve("nothing(1)", &ctx), Some(json!("")));
  }

  #[test]
  fn test_nested_template_is_literal_parsed() {
    let ctx = ctx();
    assert_eq!(resolve("{{options.count}}", &ctx), Some(json!(3)));
    assert_eq!(resolve("{{user.username}}", &ctx), Some(json!("Test")));
    assert_eq!(resolve("n={{options.count}}", &ctx), Some(json!("n=3")));
  }

  #[test]
  fn test_split_args() {
    assert_eq!(split_args(""), Vec::<&str>::new());
    assert_eq!(split_args("a, b"), vec!["a", "b"]);
    assert_eq!(split_args(r#"'x, y', f(1, 2), "q\"," "#), vec!["'x, y'", "f(1, 2)", r#""q\",""#]);
  }

  #[test]
  fn test_parse_call() {
    assert_eq!(parse_call("json.path(a, 'b')"), Some(("json.path", vec!["a", "'b'"])));
    assert_eq!(parse_call("now()"), Some(("now", vec![])));
    assert_eq!(parse_call("user.name"), None);
  }
}
