use std::collections::HashSet;

use botflow_config::{ButtonStyle, InteractiveMessage, NodeKind, NodeType, ValidationIssue, WorkflowNode};

use crate::structure::GraphIndex;

/// Output handle and re-entry checks for one node.
pub(crate) fn check(
  index: &GraphIndex<'_>,
  node: &WorkflowNode,
  node_type: NodeType,
  kind: Option<&NodeKind>,
) -> Vec<ValidationIssue> {
  let mut issues = Vec::new();
  let handles = index.handles(&node.id);
  let mut require = |handle: &str, issue: fn(String) -> ValidationIssue| {
    if !handles.contains(handle) {
      issues.push(issue(format!("{} node has no '{}' handle", node_type, handle)).at(&node.id));
    }
  };

  match node_type {
    NodeType::IfElse => {
      require("true", ValidationIssue::error);
      require("false", ValidationIssue::error);
    }
    NodeType::HttpRequest => {
      require("success", ValidationIssue::warning);
      require("failure", ValidationIssue::warning);
    }
    NodeType::Loop => {
      require("loop", ValidationIssue::warning);
      require("done", ValidationIssue::warning);
    }
    NodeType::SwitchCase => {
      require("default", ValidationIssue::warning);
      if !handles.iter().any(|h| h.starts_with("case:")) {
        issues.push(ValidationIssue::warning("SwitchCase node has no 'case:' handles").at(&node.id));
      }
    }
    _ => {}
  }

  if let Some(NodeKind::InteractiveMessage(message)) = kind {
    check_interactive(message, &handles, &node.id, &mut issues);
  }

  for edge in index.outgoing.get(node.id.as_str()).into_iter().flatten() {
    if !edge.is_loop_reentry() {
      continue;
    }
    let target_is_loop = index
      .nodes
      .get(edge.target.as_str())
      .and_then(|target| target.parsed_type())
      == Some(NodeType::Loop);
    if !target_is_loop {
      issues.push(
        ValidationIssue::warning(format!(
          "'continue' edge targets '{}', which is not a Loop node",
          edge.target
        ))
        .at(&node.id),
      );
    }
  }

  issues
}

/// Structural checks on button and select menu definitions, plus a wired
/// handle for every one of them.
fn check_interactive(
  message: &InteractiveMessage,
  handles: &HashSet<&str>,
  node_id: &str,
  issues: &mut Vec<ValidationIssue>,
) {
  let mut error = |message: String| issues.push(ValidationIssue::error(message).at(node_id));

  let mut button_ids = HashSet::new();
  for (i, button) in message.buttons.iter().enumerate() {
    if button.label.trim().is_empty() {
      error(format!("button {} has no label", i + 1));
    }
    if button.style == ButtonStyle::Link {
      if button.url.as_deref().is_none_or(|url| url.trim().is_empty()) {
        error(format!("link button {} has no URL", i + 1));
      }
      continue;
    }
    if button.id.trim().is_empty() {
      error(format!("button {} has no id", i + 1));
      continue;
    }
    if !button_ids.insert(button.id.as_str()) {
      error(format!("duplicate button id '{}'", button.id));
      continue;
    }
    let handle = format!("button:{}", button.id);
    if !handles.contains(handle.as_str()) {
      error(format!("button '{}' has no '{}' handle", button.id, handle));
    }
  }

  let mut menu_ids = HashSet::new();
  for (i, menu) in message.select_menus.iter().enumerate() {
    if menu.id.trim().is_empty() {
      error(format!("select menu {} has no id", i + 1));
      continue;
    }
    if !menu_ids.insert(menu.id.as_str()) {
      error(format!("duplicate select menu id '{}'", menu.id));
      continue;
    }
    if menu.options.is_empty() {
      error(format!("select menu '{}' has no options", menu.id));
    }

    let mut values = HashSet::new();
    for (j, option) in menu.options.iter().enumerate() {
      if option.label.trim().is_empty() {
        error(format!("option {} of select menu '{}' has no label", j + 1, menu.id));
      }
      if option.value.trim().is_empty() {
        error(format!("option {} of select menu '{}' has no value", j + 1, menu.id));
        continue;
      }
      if !values.insert(option.value.as_str()) {
        error(format!(
          "duplicate option value '{}' in select menu '{}'",
          option.value, menu.id
        ));
        continue;
      }
      let handle = format!("select:{}:{}", menu.id, option.value);
      if !handles.contains(handle.as_str()) {
        error(format!(
          "option '{}' of select menu '{}' has no '{}' handle",
          option.value, menu.id, handle
        ));
      }
    }
  }
}
