use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The invoking user. Host-specific fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub username: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guild {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// The event a workflow run is processing, plus the run's transient variables.
///
/// Owned by exactly one run. `variables` is the only part mutated during
/// execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionContext {
  pub bot_id: String,
  pub command_name: String,
  pub user: User,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub guild: Option<Guild>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub channel: Option<Channel>,
  pub options: Map<String, Value>,
  pub member_roles: Vec<String>,
  pub variables: Map<String, Value>,
}

impl ExecutionContext {
  /// The JSON value of a top-level context field, by its wire name.
  ///
  /// `vars` is an alias for `variables`. Absent optional fields and unknown
  /// names return `None`.
  pub fn root_value(&self, name: &str) -> Option<Value> {
    match name {
      "botId" => Some(Value::String(self.bot_id.clone())),
      "commandName" => Some(Value::String(self.command_name.clone())),
      "user" => serde_json::to_value(&self.user).ok(),
      "guild" => self.guild.as_ref().and_then(|g| serde_json::to_value(g).ok()),
      "channel" => self.channel.as_ref().and_then(|c| serde_json::to_value(c).ok()),
      "options" => Some(Value::Object(self.options.clone())),
      "memberRoles" => Some(Value::Array(
        self.member_roles.iter().cloned().map(Value::String).collect(),
      )),
      "variables" | "vars" => Some(Value::Object(self.variables.clone())),
      _ => None,
    }
  }

  /// The map behind `options`, `variables` or `vars`, borrowed.
  pub fn root_map(&self, name: &str) -> Option<&Map<String, Value>> {
    match name {
      "options" => Some(&self.options),
      "variables" | "vars" => Some(&self.variables),
      _ => None,
    }
  }

  pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
    self.variables.insert(name.into(), value);
  }

  pub fn has_role(&self, role: &str) -> bool {
    self.member_roles.iter().any(|r| r == role)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_event() {
    let ctx: ExecutionContext = serde_json::from_value(json!({
      "botId": "bot-1",
      "commandName": "greet",
      "user": { "id": "42", "username": "Test", "avatar": "abc" },
      "guild": { "id": "g1", "name": "Home" },
      "options": { "count": 3 },
      "memberRoles": ["admin"]
    }))
    .unwrap();

    assert_eq!(ctx.user.username, "Test");
    assert_eq!(ctx.user.extra.get("avatar"), Some(&json!("abc")));
    assert!(ctx.channel.is_none());
    assert!(ctx.has_role("admin"));
    assert!(ctx.variables.is_empty());
  }

  #[test]
  fn test_root_value() {
    let mut ctx = ExecutionContext::default();
    ctx.user.username = "Test".to_string();
    ctx.set_variable("items", json!(["a"]));

    assert_eq!(ctx.root_value("user").unwrap()["username"], "Test");
    assert_eq!(ctx.root_value("vars"), Some(json!({ "items": ["a"] })));
    assert_eq!(ctx.root_value("guild"), None);
    assert_eq!(ctx.root_value("nope"), None);
    assert_eq!(ctx.root_map("variables").unwrap()["items"], json!(["a"]));
    assert!(ctx.root_map("user").is_none());
  }
}
