//! Typed node data.
//!
//! Each node type reads a fixed set of keys from the node's open `data` map.
//! [`NodeKind::from_data`] narrows the map into one of the structs below so
//! the interpreter can dispatch on a sum type instead of probing JSON.
//!
//! Narrowing is lenient about absence (missing keys take their defaults, the
//! validator reports them separately) but strict about shape: a string where a
//! list of buttons is expected is a [`NodeDataError`].

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::{ConditionGroup, deserialize_group_or_list};
use crate::node_type::NodeType;

/// Failure to narrow a node's data map into its typed form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid data for {node_type} node: {message}")]
pub struct NodeDataError {
  pub node_type: NodeType,
  pub message: String,
}

/// A text field that is rendered as a `{{ }}` template at run time.
///
/// The editor sometimes stores ids as numbers, so any JSON scalar is accepted
/// and kept in its text form. `null` is the empty template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Template(pub String);

impl Template {
  pub fn new(text: impl Into<String>) -> Self {
    Self(text.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl fmt::Display for Template {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for Template {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    match Value::deserialize(deserializer)? {
      Value::Null => Ok(Template::default()),
      Value::String(s) => Ok(Template(s)),
      Value::Bool(b) => Ok(Template(b.to_string())),
      Value::Number(n) => Ok(Template(n.to_string())),
      other => Err(de::Error::custom(format!(
        "expected a text value, found {}",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlashCommandTrigger {
  pub command_name: String,
  pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageTrigger {
  pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplyMessage {
  pub content: Template,
  pub ephemeral: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendChannelMessage {
  /// Falls back to the channel of the triggering event when empty.
  pub channel_id: Template,
  pub content: Template,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendDm {
  /// Falls back to the invoking user when empty.
  pub user_id: Template,
  pub content: Template,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedField {
  pub name: Template,
  pub value: Template,
  pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedMessage {
  pub channel_id: Template,
  pub title: Template,
  pub description: Template,
  /// Either a number or a `#rrggbb` string.
  pub color: Option<Value>,
  pub footer: Template,
  pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IfElse {
  #[serde(deserialize_with = "deserialize_group_or_list")]
  pub conditions: ConditionGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwitchCase {
  pub expression: Template,
  /// Case values offered by the editor. Routing only looks at edge handles.
  pub cases: Vec<Template>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopData {
  pub list_expression: Template,
  pub item_var: String,
  pub index_var: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetVariable {
  pub name: String,
  pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetPersistentVariable {
  pub scope: String,
  pub key: Template,
  pub variable: String,
  pub default_value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetPersistentVariable {
  pub scope: String,
  pub key: Template,
  pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Delay {
  pub duration_ms: Template,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpRequest {
  pub method: Template,
  pub url: Template,
  pub headers: BTreeMap<String, Template>,
  pub body: Template,
  pub response_variable: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleChange {
  pub role_id: Template,
  /// Member to change. Falls back to the invoking user when empty.
  pub user_id: Template,
  pub reason: Template,
}

pub type AddRole = RoleChange;
pub type RemoveRole = RoleChange;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  #[default]
  Info,
  Warn,
  Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Logger {
  pub message: Template,
  pub level: LogLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stop {
  pub reason: Template,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ButtonStyle {
  #[default]
  Primary,
  Secondary,
  Success,
  Danger,
  Link,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonDef {
  pub id: String,
  pub label: String,
  pub style: ButtonStyle,
  pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOption {
  pub label: String,
  pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectMenuDef {
  pub id: String,
  pub placeholder: String,
  pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractiveMessage {
  pub content: Template,
  pub buttons: Vec<ButtonDef>,
  pub select_menus: Vec<SelectMenuDef>,
  pub timeout_ms: Option<u64>,
  pub response_variable: Option<String>,
}

impl InteractiveMessage {
  /// Output handles this node can route to, in declaration order.
  ///
  /// Link buttons open a URL on the client and never produce an interaction,
  /// so they have no handle.
  pub fn dynamic_handles(&self) -> Vec<String> {
    let buttons = self
      .buttons
      .iter()
      .filter(|b| b.style != ButtonStyle::Link)
      .map(|b| format!("button:{}", b.id));
    let options = self.select_menus.iter().flat_map(|menu| {
      menu
        .options
        .iter()
        .map(move |o| format!("select:{}:{}", menu.id, o.value))
    });
    buttons.chain(options).collect()
  }
}

/// Typed node data, one variant per [`NodeType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeKind {
  SlashCommandTrigger(SlashCommandTrigger),
  MessageTrigger(MessageTrigger),
  MemberJoinTrigger,
  ReplyMessage(ReplyMessage),
  SendChannelMessage(SendChannelMessage),
  SendDm(SendDm),
  EmbedMessage(EmbedMessage),
  IfElse(IfElse),
  SwitchCase(SwitchCase),
  Loop(LoopData),
  Stop(Stop),
  SetVariable(SetVariable),
  GetPersistentVariable(GetPersistentVariable),
  SetPersistentVariable(SetPersistentVariable),
  Delay(Delay),
  HttpRequest(HttpRequest),
  AddRole(RoleChange),
  RemoveRole(RoleChange),
  Logger(Logger),
  InteractiveMessage(InteractiveMessage),
}

impl NodeKind {
  /// Narrow a node's open data map into the typed form for `node_type`.
  pub fn from_data(node_type: NodeType, data: &Map<String, Value>) -> Result<Self, NodeDataError> {
    let kind = match node_type {
      NodeType::SlashCommandTrigger => NodeKind::SlashCommandTrigger(narrow(node_type, data)?),
      NodeType::MessageTrigger => NodeKind::MessageTrigger(narrow(node_type, data)?),
      NodeType::MemberJoinTrigger => NodeKind::MemberJoinTrigger,
      NodeType::ReplyMessage => NodeKind::ReplyMessage(narrow(node_type, data)?),
      NodeType::SendChannelMessage => NodeKind::SendChannelMessage(narrow(node_type, data)?),
      NodeType::SendDm => NodeKind::SendDm(narrow(node_type, data)?),
      NodeType::EmbedMessage => NodeKind::EmbedMessage(narrow(node_type, data)?),
      NodeType::IfElse => NodeKind::IfElse(narrow(node_type, data)?),
      NodeType::SwitchCase => NodeKind::SwitchCase(narrow(node_type, data)?),
      NodeType::Loop => NodeKind::Loop(narrow(node_type, data)?),
      NodeType::Stop => NodeKind::Stop(narrow(node_type, data)?),
      NodeType::SetVariable => NodeKind::SetVariable(narrow(node_type, data)?),
      NodeType::GetPersistentVariable => NodeKind::GetPersistentVariable(narrow(node_type, data)?),
      NodeType::SetPersistentVariable => NodeKind::SetPersistentVariable(narrow(node_type, data)?),
      NodeType::Delay => NodeKind::Delay(narrow(node_type, data)?),
      NodeType::HttpRequest => NodeKind::HttpRequest(narrow(node_type, data)?),
      NodeType::AddRole => NodeKind::AddRole(narrow(node_type, data)?),
      NodeType::RemoveRole => NodeKind::RemoveRole(narrow(node_type, data)?),
      NodeType::Logger => NodeKind::Logger(narrow(node_type, data)?),
      NodeType::InteractiveMessage => NodeKind::InteractiveMessage(narrow(node_type, data)?),
    };
    Ok(kind)
  }

  /// Whether this kind starts a workflow.
  pub fn is_trigger(&self) -> bool {
    matches!(
      self,
      NodeKind::SlashCommandTrigger(_) | NodeKind::MessageTrigger(_) | NodeKind::MemberJoinTrigger
    )
  }
}

fn narrow<T: DeserializeOwned>(
  node_type: NodeType,
  data: &Map<String, Value>,
) -> Result<T, NodeDataError> {
  serde_json::from_value(Value::Object(data.clone())).map_err(|e| NodeDataError {
    node_type,
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::condition::{LogicalOp, Rule};
  use serde_json::json;

  fn data(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected object"),
    }
  }

  #[test]
  fn test_template_accepts_scalars() {
    let kind = NodeKind::from_data(
      NodeType::AddRole,
      &data(json!({ "roleId": 123456789, "reason": null })),
    )
    .unwrap();

    match kind {
      NodeKind::AddRole(change) => {
        assert_eq!(change.role_id.as_str(), "123456789");
        assert!(change.reason.is_empty());
        assert!(change.user_id.is_empty());
      }
      other => panic!("unexpected kind: {:?}", other),
    }
  }

  #[test]
  fn test_missing_fields_default() {
    let kind = NodeKind::from_data(NodeType::ReplyMessage, &Map::new()).unwrap();
    assert_eq!(kind, NodeKind::ReplyMessage(ReplyMessage::default()));
  }

  #[test]
  fn test_wrong_shape_is_an_error() {
    let err = NodeKind::from_data(
      NodeType::InteractiveMessage,
      &data(json!({ "content": "pick", "buttons": "not a list" })),
    )
    .unwrap_err();
    assert_eq!(err.node_type, NodeType::InteractiveMessage);
  }

  #[test]
  fn test_if_else_accepts_legacy_rule_list() {
    let kind = NodeKind::from_data(
      NodeType::IfElse,
      &data(json!({
        "conditions": [
          { "left": "{{user.username}}", "operator": "equals", "right": "Test" }
        ]
      })),
    )
    .unwrap();

    match kind {
      NodeKind::IfElse(if_else) => {
        assert_eq!(if_else.conditions.op, LogicalOp::And);
        assert!(matches!(if_else.conditions.rules[0], Rule::Leaf(_)));
      }
      other => panic!("unexpected kind: {:?}", other),
    }
  }

  #[test]
  fn test_interactive_dynamic_handles_skip_link_buttons() {
    let kind = NodeKind::from_data(
      NodeType::InteractiveMessage,
      &data(json!({
        "content": "pick",
        "buttons": [
          { "id": "yes", "label": "Yes" },
          { "id": "docs", "label": "Docs", "style": "LINK", "url": "https://example.com" }
        ],
        "selectMenus": [
          { "id": "color", "options": [ { "label": "Red", "value": "red" } ] }
        ]
      })),
    )
    .unwrap();

    let NodeKind::InteractiveMessage(message) = kind else {
      panic!("expected interactive message");
    };
    assert_eq!(
      message.dynamic_handles(),
      vec!["button:yes".to_string(), "select:color:red".to_string()]
    );
  }
}
