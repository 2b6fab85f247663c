use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::Template;

/// How the rules of a [`ConditionGroup`] are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
  #[default]
  #[serde(rename = "AND", alias = "and")]
  And,
  #[serde(rename = "OR", alias = "or")]
  Or,
}

/// A single `left operator right` comparison.
///
/// Operands are resolved by the expression engine, so they may be literals,
/// context paths, function calls or `{{ }}` templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
  #[serde(default)]
  pub left: Template,
  pub operator: String,
  #[serde(default)]
  pub right: Template,
}

impl Condition {
  pub fn new(left: impl Into<String>, operator: impl Into<String>, right: impl Into<String>) -> Self {
    Self {
      left: Template::new(left),
      operator: operator.into(),
      right: Template::new(right),
    }
  }
}

/// One entry of a condition group: a leaf comparison or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
  Group(ConditionGroup),
  Leaf(Condition),
}

/// A tree of conditions combined with AND or OR. An empty group is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
  #[serde(default)]
  pub op: LogicalOp,
  pub rules: Vec<Rule>,
}

impl ConditionGroup {
  pub fn all(rules: Vec<Rule>) -> Self {
    Self {
      op: LogicalOp::And,
      rules,
    }
  }

  pub fn any(rules: Vec<Rule>) -> Self {
    Self {
      op: LogicalOp::Or,
      rules,
    }
  }
}

/// Accepts a group, a bare list of rules (combined with AND) or a single
/// condition. `null` is the empty group.
pub(crate) fn deserialize_group_or_list<'de, D>(deserializer: D) -> Result<ConditionGroup, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Shape {
    Group(ConditionGroup),
    List(Vec<Rule>),
    Single(Condition),
    Empty(()),
  }

  let value = Value::deserialize(deserializer)?;
  let shape = Shape::deserialize(value).map_err(serde::de::Error::custom)?;
  Ok(match shape {
    Shape::Group(group) => group,
    Shape::List(rules) => ConditionGroup::all(rules),
    Shape::Single(condition) => ConditionGroup::all(vec![Rule::Leaf(condition)]),
    Shape::Empty(()) => ConditionGroup::default(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Deserialize)]
  struct Holder {
    #[serde(deserialize_with = "deserialize_group_or_list")]
    conditions: ConditionGroup,
  }

  fn parse(conditions: Value) -> ConditionGroup {
    serde_json::from_value::<Holder>(json!({ "conditions": conditions }))
      .unwrap()
      .conditions
  }

  #[test]
  fn test_nested_group() {
    let group = parse(json!({
      "op": "OR",
      "rules": [
        { "left": "{{user.id}}", "operator": "equals", "right": "1" },
        { "op": "and", "rules": [] }
      ]
    }));

    assert_eq!(group.op, LogicalOp::Or);
    assert_eq!(group.rules.len(), 2);
    assert!(matches!(group.rules[0], Rule::Leaf(_)));
    match &group.rules[1] {
      Rule::Group(inner) => {
        assert_eq!(inner.op, LogicalOp::And);
        assert!(inner.rules.is_empty());
      }
      other => panic!("expected group, got {:?}", other),
    }
  }

  #[test]
  fn test_single_condition_and_null() {
    let group = parse(json!({ "left": "a", "operator": "equals", "right": "a" }));
    assert_eq!(group.op, LogicalOp::And);
    assert_eq!(group.rules.len(), 1);

    assert_eq!(parse(Value::Null), ConditionGroup::default());
  }

  #[test]
  fn test_numeric_operands_become_text() {
    let group = parse(json!([{ "left": "{{options.count}}", "operator": "gt", "right": 3 }]));
    let Rule::Leaf(condition) = &group.rules[0] else {
      panic!("expected leaf");
    };
    assert_eq!(condition.right.as_str(), "3");
  }
}
