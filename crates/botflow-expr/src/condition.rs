use std::str::FromStr;

use botflow_config::{Condition, ConditionGroup, ExecutionContext, LogicalOp, Rule};
use serde_json::Value;

use crate::coerce::{strict_equals, to_number, to_text};
use crate::resolve::resolve;

/// Comparison operators understood by [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Equals,
  NotEquals,
  Contains,
  StartsWith,
  EndsWith,
  Gt,
  Lt,
  In,
  /// Membership of the right operand in the member's roles. Registered
  /// under both `hasRole` and `hasPermission`.
  HasRole,
}

impl Operator {
  pub const NAMES: &'static [&'static str] = &[
    "equals",
    "notEquals",
    "contains",
    "startsWith",
    "endsWith",
    "gt",
    "lt",
    "in",
    "hasRole",
    "hasPermission",
  ];
}

impl FromStr for Operator {
  type Err = UnknownOperator;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s {
      "equals" => Operator::Equals,
      "notEquals" => Operator::NotEquals,
      "contains" => Operator::Contains,
      "startsWith" => Operator::StartsWith,
      "endsWith" => Operator::EndsWith,
      "gt" => Operator::Gt,
      "lt" => Operator::Lt,
      "in" => Operator::In,
      "hasRole" | "hasPermission" => Operator::HasRole,
      other => return Err(UnknownOperator(other.to_string())),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

/// Resolve both operands and compare them. Unknown operators are false.
pub fn evaluate(left: &str, operator: &str, right: &str, ctx: &ExecutionContext) -> bool {
  let Ok(operator) = operator.trim().parse::<Operator>() else {
    return false;
  };
  let left = resolve(left, ctx);
  let right = resolve(right, ctx);
  compare(operator, left.as_ref(), right.as_ref(), ctx)
}

pub fn evaluate_condition(condition: &Condition, ctx: &ExecutionContext) -> bool {
  evaluate(
    condition.left.as_str(),
    &condition.operator,
    condition.right.as_str(),
    ctx,
  )
}

/// Evaluate a condition tree. An empty group is true.
pub fn evaluate_group(group: &ConditionGroup, ctx: &ExecutionContext) -> bool {
  let check = |rule: &Rule| match rule {
    Rule::Leaf(condition) => evaluate_condition(condition, ctx),
    Rule::Group(inner) => evaluate_group(inner, ctx),
  };
  match group.op {
    LogicalOp::And => group.rules.iter().all(check),
    LogicalOp::Or => group.rules.is_empty() || group.rules.iter().any(check),
  }
}

fn compare(
  operator: Operator,
  left: Option<&Value>,
  right: Option<&Value>,
  ctx: &ExecutionContext,
) -> bool {
  match operator {
    Operator::Equals => strict_equals(left, right),
    Operator::NotEquals => !strict_equals(left, right),
    Operator::Contains => texts(left, right).is_some_and(|(l, r)| l.contains(&r)),
    Operator::StartsWith => texts(left, right).is_some_and(|(l, r)| l.starts_with(&r)),
    Operator::EndsWith => texts(left, right).is_some_and(|(l, r)| l.ends_with(&r)),
    Operator::Gt => to_number(left) > to_number(right),
    Operator::Lt => to_number(left) < to_number(right),
    Operator::In => match right {
      Some(Value::Array(items)) => items.iter().any(|item| strict_equals(left, Some(item))),
      _ => texts(right, left).is_some_and(|(r, l)| r.contains(&l)),
    },
    Operator::HasRole => ctx.has_role(&to_text(right)),
  }
}

/// Both operands as text. `undefined` on either side never matches.
fn texts(left: Option<&Value>, right: Option<&Value>) -> Option<(String, String)> {
  Some((to_text(Some(left?)), to_text(Some(right?))))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> ExecutionContext {
    serde_json::from_value(json!({
      "user": { "id": "42", "username": "Test" },
      "options": { "count": 3, "word": "" },
      "memberRoles": ["admin", "123"],
      "variables": { "tags": ["x", "y"], "n": "10" }
    }))
    .unwrap()
  }

  #[test]
  fn test_equality() {
    let ctx = ctx();
    assert!(evaluate("user.username", "equals", r#""Test""#, &ctx));
    assert!(evaluate("{{user.username}}", "equals", "Test", &ctx));
    assert!(evaluate("options.count", "equals", "3", &ctx));
    assert!(!evaluate("vars.n", "equals", "10", &ctx));
    assert!(evaluate("vars.n", "notEquals", "10", &ctx));
  }

  #[test]
  fn test_string_operators() {
    let ctx = ctx();
    assert!(evaluate("user.username", "contains", "es", &ctx));
    assert!(evaluate("user.username", "startsWith", "Te", &ctx));
    assert!(evaluate("user.username", "endsWith", "st", &ctx));
    assert!(!evaluate("user.username", "endsWith", "Te", &ctx));
  }

  #[test]
  fn test_numeric_operators() {
    let ctx = ctx();
    assert!(evaluate("vars.n", "gt", "options.count", &ctx));
    assert!(evaluate("options.word", "lt", "1", &ctx));
    assert!(!evaluate("vars.missing", "gt", "0", &ctx));
    assert!(!evaluate("vars.missing", "lt", "0", &ctx));
  }

  #[test]
  fn test_membership() {
    let ctx = ctx();
    assert!(evaluate("'x'", "in", "vars.tags", &ctx));
    assert!(!evaluate("'z'", "in", "vars.tags", &ctx));
    assert!(evaluate("'ell'", "in", "'hello'", &ctx));
    assert!(evaluate("", "hasRole", "admin", &ctx));
    assert!(evaluate("", "hasPermission", "123", &ctx));
    assert!(!evaluate("", "hasRole", "moderator", &ctx));
  }

  #[test]
  fn test_undefined_operand_never_matches_text() {
    let ctx = ctx();
    for operator in ["contains", "startsWith", "endsWith", "in"] {
      assert!(!evaluate("vars.missing", operator, "'admin,mod'", &ctx), "{operator} left");
      assert!(!evaluate("user.username", operator, "vars.missing", &ctx), "{operator} right");
      assert!(!evaluate("undefined", operator, "undefined", &ctx), "{operator} both");
    }
    assert!(!evaluate("vars.missing", "in", "vars.tags", &ctx));

    // empty text is still a value
    assert!(evaluate("user.username", "contains", "options.word", &ctx));
    assert!(evaluate("options.word", "in", "'abc'", &ctx));
  }

  #[test]
  fn test_unknown_operator_is_false() {
    assert!(!evaluate("1", "roughly", "1", &ctx()));
  }

  #[test]
  fn test_groups() {
    let ctx = ctx();
    let yes = Rule::Leaf(Condition::new("1", "equals", "1"));
    let no = Rule::Leaf(Condition::new("1", "equals", "2"));

    assert!(evaluate_group(&ConditionGroup::default(), &ctx));
    assert!(evaluate_group(&ConditionGroup::any(vec![]), &ctx));
    assert!(!evaluate_group(&ConditionGroup::all(vec![yes.clone(), no.clone()]), &ctx));
    assert!(evaluate_group(&ConditionGroup::any(vec![no.clone(), yes.clone()]), &ctx));

    let nested = ConditionGroup::all(vec![
      yes.clone(),
      Rule::Group(ConditionGroup::any(vec![no, yes])),
    ]);
    assert!(evaluate_group(&nested, &ctx));
  }
}
