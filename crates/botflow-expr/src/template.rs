use std::sync::LazyLock;

use botflow_config::ExecutionContext;
use regex::{Captures, Regex};

use crate::coerce::to_text;
use crate::resolve::resolve;

static PLACEHOLDER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("placeholder pattern is valid"));

/// Replace every `{{ expr }}` in `template` with the text of its resolved
/// value. The first `}}` closes a placeholder.
pub fn render(template: &str, ctx: &ExecutionContext) -> String {
  if !template.contains("{{") {
    return template.to_string();
  }
  PLACEHOLDER
    .replace_all(template, |caps: &Captures| {
      let expr = caps.get(1).map_or("", |m| m.as_str());
      to_text(resolve(expr, ctx).as_ref())
    })
    .into_owned()
}

/// The trimmed expressions of every placeholder in `text`, in order.
pub fn template_expressions(text: &str) -> Vec<&str> {
  PLACEHOLDER
    .captures_iter(text)
    .filter_map(|caps| caps.get(1))
    .map(|m| m.as_str().trim())
    .collect()
}
