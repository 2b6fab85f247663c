use botflow_config::{
  CURRENT_SCHEMA_VERSION, ConditionGroup, LEGACY_TRIGGER, NodeKind, Rule,
  ValidationIssue, WorkflowGraph, WorkflowNode,
};
use botflow_expr::{ALLOWED_FUNCTIONS, ALLOWED_ROOTS, Operator, is_literal, parse_call, template_expressions};
use serde_json::Value;

use crate::handles;
use crate::structure::GraphIndex;

/// Per-node checks, in a fixed order.
pub(crate) fn check(
  graph: &WorkflowGraph,
  index: &GraphIndex<'_>,
  node: &WorkflowNode,
) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();

  let Some(node_type) = node.parsed_type() else {
    issues.push(ValidationIssue::error(format!("unknown node type '{}'", node.node_type)).at(&node.id));
    return issues;
  };

  if node.node_type == LEGACY_TRIGGER && graph.version >= CURRENT_SCHEMA_VERSION {
    issues.push(
      ValidationIssue::warning(format!(
        "legacy '{}' node type; use SlashCommandTrigger",
        LEGACY_TRIGGER
      ))
      .at(&node.id),
    );
  }

  for field in node_type.required_fields() {
    if is_blank(node.data.get(*field)) {
      issues.push(
        ValidationIssue::error(format!("{} node requires '{}'", node_type, field)).at(&node.id),
      );
    }
  }

  let kind = match NodeKind::from_data(node_type, &node.data) {
    Ok(kind) => Some(kind),
    Err(e) => {
      issues.push(ValidationIssue::error(e.to_string()).at(&node.id));
      None
    }
  };

  for field in node_type.template_fields() {
    if let Some(Value::String(text)) = node.data.get(*field) {
      check_template(text, &node.id, &mut issues);
    }
  }
  match &kind {
    Some(NodeKind::HttpRequest(request)) => {
      for value in request.headers.values() {
        check_template(value.as_str(), &node.id, &mut issues);
      }
    }
    Some(NodeKind::EmbedMessage(embed)) => {
      for field in &embed.fields {
        check_template(field.name.as_str(), &node.id, &mut issues);
        check_template(field.value.as_str(), &node.id, &mut issues);
      }
    }
    Some(NodeKind::IfElse(if_else)) => check_conditions(&if_else.conditions, &node.id, &mut issues),
    _ => {}
  }

  if !node_type.is_trigger() && index.incoming.get(node.id.as_str()).copied().unwrap_or(0) == 0 {
    issues.push(ValidationIssue::warning("node is unreachable: no incoming edges").at(&node.id));
  }

  issues.extend(handles::check(index, node, node_type, kind.as_ref()));
  issues
}

/// Missing, `null`, blank text and empty collections count as absent.
fn is_blank(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(s)) => s.trim().is_empty(),
    Some(Value::Array(items)) => items.is_empty(),
    Some(Value::Object(map)) => map.is_empty(),
    Some(_) => false,
  }
}

fn check_template(text: &str, node_id: &str, issues: &mut Vec<ValidationIssue>) {
  for expr in template_expressions(text) {
    if let Some(message) = check_expression(expr) {
      issues.push(ValidationIssue::warning(message).at(node_id));
    }
  }
}

/// Describe the first unknown root or function in `expr`, if any.
fn check_expression(expr: &str) -> Option<String> {
  let expr = expr.trim();
  if expr.is_empty() || is_literal(expr) {
    return None;
  }
  if let Some((name, args)) = parse_call(expr) {
    if !ALLOWED_FUNCTIONS.contains(&name) {
      return Some(format!("unknown template function '{}'", name));
    }
    return args.into_iter().find_map(check_argument);
  }
  let root = expr.split('.').next().unwrap_or(expr);
  if ALLOWED_ROOTS.contains(&root) {
    None
  } else {
    Some(format!("unknown template root '{}'", root))
  }
}

/// Function arguments may also be bare words, which resolve to themselves.
fn check_argument(arg: &str) -> Option<String> {
  if parse_call(arg).is_some() || arg.contains('.') {
    check_expression(arg)
  } else {
    None
  }
}

fn check_conditions(group: &ConditionGroup, node_id: &str, issues: &mut Vec<ValidationIssue>) {
  for rule in &group.rules {
    match rule {
      Rule::Group(inner) => check_conditions(inner, node_id, issues),
      Rule::Leaf(condition) => {
        if condition.operator.trim().parse::<Operator>().is_err() {
          issues.push(
            ValidationIssue::warning(format!(
              "unknown condition operator '{}' is always false",
              condition.operator
            ))
            .at(node_id),
          );
        }
        check_template(condition.left.as_str(), node_id, issues);
        check_template(condition.right.as_str(), node_id, issues);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_check_expression() {
    assert_eq!(check_expression("user.username"), None);
    assert_eq!(check_expression("'literal'"), None);
    assert_eq!(check_expression("upper(vars.name)"), None);
    assert_eq!(check_expression("random(1, 6)"), None);
    assert_eq!(
      check_expression("secrets.token"),
      Some("unknown template root 'secrets'".to_string())
    );
    assert_eq!(
      check_expression("shout(user.username)"),
      Some("unknown template function 'shout'".to_string())
    );
    assert_eq!(
      check_expression("upper(secrets.token)"),
      Some("unknown template root 'secrets'".to_string())
    );
  }

  #[test]
  fn test_is_blank() {
    assert!(is_blank(None));
    assert!(is_blank(Some(&Value::String("  ".into()))));
    assert!(is_blank(Some(&serde_json::json!([]))));
    assert!(!is_blank(Some(&serde_json::json!(0))));
    assert!(!is_blank(Some(&serde_json::json!(false))));
  }
}
