use botflow_config::ExecutionContext;
use serde_json::Value;

/// Top-level identifiers a template expression may start with.
pub const ALLOWED_ROOTS: &[&str] = &[
  "user",
  "guild",
  "channel",
  "options",
  "vars",
  "variables",
  "memberRoles",
  "botId",
  "commandName",
];

/// Walk `segments` into `value` by property access.
///
/// Numeric segments index arrays and `length` reads the length of an array
/// or string. A missing step yields `None`.
pub fn lookup<'a, I>(value: &Value, segments: I) -> Option<Value>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut segments = segments.into_iter();
  let mut current = value;
  while let Some(segment) = segments.next() {
    current = match current {
      Value::Object(map) => map.get(segment)?,
      Value::Array(items) => match segment.parse::<usize>() {
        Ok(index) => items.get(index)?,
        Err(_) if segment == "length" => return length_at_end(items.len(), segments),
        Err(_) => return None,
      },
      Value::String(s) if segment == "length" => {
        return length_at_end(s.chars().count(), segments);
      }
      _ => return None,
    };
  }
  Some(current.clone())
}

fn length_at_end<'a>(len: usize, mut rest: impl Iterator<Item = &'a str>) -> Option<Value> {
  match rest.next() {
    None => Some(Value::from(len)),
    Some(_) => None,
  }
}

/// `ident(.segment)*` where segments are word characters, `$` or `-`.
pub(crate) fn is_path_shaped(text: &str) -> bool {
  let mut segments = text.split('.');
  let Some(root) = segments.next() else {
    return false;
  };
  let word = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
  let root_ok = root.chars().next().is_some_and(|c| word(c) && !c.is_ascii_digit())
    && root.chars().all(word);
  root_ok && segments.all(|s| !s.is_empty() && s.chars().all(|c| word(c) || c == '-'))
}

/// Resolve a dotted path against the context.
///
/// `vars.` and `variables.` read run variables. A known root with a missing
/// field is `undefined`, as is a dotted path under an unknown root. A single
/// bare word that names no root is returned as text.
pub(crate) fn resolve_path(text: &str, ctx: &ExecutionContext) -> Option<Value> {
  let mut segments = text.split('.');
  let root = segments.next()?;
  let rest: Vec<&str> = segments.collect();

  if let (Some(map), Some((first, tail))) = (ctx.root_map(root), rest.split_first()) {
    return map.get(*first).and_then(|value| lookup(value, tail.iter().copied()));
  }

  match ctx.root_value(root) {
    Some(value) => lookup(&value, rest),
    None if rest.is_empty() && !ALLOWED_ROOTS.contains(&root) => Some(Value::String(text.to_string())),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_lookup() {
    let value = json!({ "a": { "b": [10, 20] }, "s": "héllo" });
    assert_eq!(lookup(&value, ["a", "b", "1"]), Some(json!(20)));
    assert_eq!(lookup(&value, ["a", "b", "length"]), Some(json!(2)));
    assert_eq!(lookup(&value, ["a", "b", "length", "x"]), None);
    assert_eq!(lookup(&value, ["s", "length"]), Some(json!(5)));
    assert_eq!(lookup(&value, ["a", "missing", "x"]), None);
    assert_eq!(lookup(&value, Vec::<&str>::new()), Some(value.clone()));
  }

  #[test]
  fn test_null_intermediate_short_circuits() {
    let value = json!({ "a": null });
    assert_eq!(lookup(&value, ["a"]), Some(Value::Null));
    assert_eq!(lookup(&value, ["a", "b"]), None);
  }

  #[test]
  fn test_is_path_shaped() {
    assert!(is_path_shaped("user.username"));
    assert!(is_path_shaped("vars.items.0"));
    assert!(is_path_shaped("options.some-flag"));
    assert!(!is_path_shaped("0abc"));
    assert!(!is_path_shaped("hello world"));
    assert!(!is_path_shaped("a..b"));
    assert!(!is_path_shaped(""));
  }

  #[test]
  fn test_resolve_path() {
    let mut ctx = ExecutionContext::default();
    ctx.user.username = "Test".to_string();
    ctx.set_variable("item", json!("a"));

    assert_eq!(resolve_path("user.username", &ctx), Some(json!("Test")));
    assert_eq!(resolve_path("vars.item", &ctx), Some(json!("a")));
    assert_eq!(resolve_path("variables.item", &ctx), Some(json!("a")));
    assert_eq!(resolve_path("guild.id", &ctx), None);
    assert_eq!(resolve_path("guild", &ctx), None);
    assert_eq!(resolve_path("user.missing", &ctx), None);
    assert_eq!(resolve_path("foo.bar", &ctx), None);
    assert_eq!(resolve_path("admin", &ctx), Some(json!("admin")));
  }

  #[test]
  fn test_resolve_path_into_run_maps() {
    let mut ctx = ExecutionContext::default();
    ctx.options.insert("picks".to_string(), json!(["x", "y"]));
    ctx.set_variable("profile", json!({ "name": "Ana", "tags": [] }));

    assert_eq!(resolve_path("options.picks.1", &ctx), Some(json!("y")));
    assert_eq!(resolve_path("vars.profile.name.length", &ctx), Some(json!(3)));
    assert_eq!(resolve_path("vars.profile.tags.length", &ctx), Some(json!(0)));
    assert_eq!(resolve_path("vars.profile.missing", &ctx), None);
    assert_eq!(resolve_path("vars.nothing", &ctx), None);
    assert_eq!(resolve_path("options", &ctx), Some(json!({ "picks": ["x", "y"] })));
  }
}
