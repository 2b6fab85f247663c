use std::fmt;

use serde::{Deserialize, Serialize};

/// Type name used for the single trigger of schema version 1 graphs.
pub const LEGACY_TRIGGER: &str = "Trigger";

/// Defines the closed set of node types along with their wire names.
macro_rules! define_node_types {
  ( $( $variant:ident => $name:literal ),* $(,)? ) => {
    /// The closed set of node types the engine knows how to run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum NodeType {
      $(
        #[serde(rename = $name)]
        $variant,
      )*
    }

    impl NodeType {
      /// Every node type, in declaration order.
      pub const ALL: &'static [NodeType] = &[ $( NodeType::$variant ),* ];

      /// The wire name of this node type.
      pub fn as_str(&self) -> &'static str {
        match self {
          $( NodeType::$variant => $name, )*
        }
      }

      /// Parse a wire name. The legacy `Trigger` name maps to the slash command trigger.
      pub fn parse(name: &str) -> Option<NodeType> {
        match name {
          $( $name => Some(NodeType::$variant), )*
          LEGACY_TRIGGER => Some(NodeType::SlashCommandTrigger),
          _ => None,
        }
      }
    }
  };
}

define_node_types! {
  SlashCommandTrigger => "SlashCommandTrigger",
  MessageTrigger => "MessageTrigger",
  MemberJoinTrigger => "MemberJoinTrigger",
  ReplyMessage => "ReplyMessage",
  SendChannelMessage => "SendChannelMessage",
  SendDm => "SendDM",
  EmbedMessage => "EmbedMessage",
  IfElse => "IfElse",
  SwitchCase => "SwitchCase",
  Loop => "Loop",
  Stop => "Stop",
  SetVariable => "SetVariable",
  GetPersistentVariable => "GetPersistentVariable",
  SetPersistentVariable => "SetPersistentVariable",
  Delay => "Delay",
  HttpRequest => "HttpRequest",
  AddRole => "AddRole",
  RemoveRole => "RemoveRole",
  Logger => "Logger",
  InteractiveMessage => "InteractiveMessage",
}

impl NodeType {
  /// Whether this type starts a workflow.
  pub fn is_trigger(&self) -> bool {
    matches!(
      self,
      NodeType::SlashCommandTrigger | NodeType::MessageTrigger | NodeType::MemberJoinTrigger
    )
  }

  /// Data keys that must be present and non-empty for this type.
  pub fn required_fields(&self) -> &'static [&'static str] {
    match self {
      NodeType::SlashCommandTrigger => &["commandName"],
      NodeType::ReplyMessage | NodeType::SendChannelMessage | NodeType::SendDm => &["content"],
      NodeType::EmbedMessage => &["title"],
      NodeType::IfElse => &["conditions"],
      NodeType::SwitchCase => &["expression"],
      NodeType::Loop => &["listExpression", "itemVar"],
      NodeType::SetVariable => &["name"],
      NodeType::GetPersistentVariable => &["scope", "key", "variable"],
      NodeType::SetPersistentVariable => &["scope", "key"],
      NodeType::Delay => &["durationMs"],
      NodeType::HttpRequest => &["method", "url"],
      NodeType::AddRole | NodeType::RemoveRole => &["roleId"],
      NodeType::Logger => &["message"],
      NodeType::InteractiveMessage => &["content"],
      NodeType::MessageTrigger | NodeType::MemberJoinTrigger | NodeType::Stop => &[],
    }
  }

  /// Data keys whose values are rendered as templates at run time.
  pub fn template_fields(&self) -> &'static [&'static str] {
    match self {
      NodeType::ReplyMessage | NodeType::InteractiveMessage => &["content"],
      NodeType::SendChannelMessage => &["channelId", "content"],
      NodeType::SendDm => &["userId", "content"],
      NodeType::EmbedMessage => &["channelId", "title", "description", "footer"],
      NodeType::SwitchCase => &["expression"],
      NodeType::Loop => &["listExpression"],
      NodeType::SetVariable => &["value"],
      NodeType::GetPersistentVariable => &["key"],
      NodeType::SetPersistentVariable => &["key", "value"],
      NodeType::Delay => &["durationMs"],
      NodeType::HttpRequest => &["url", "body"],
      NodeType::AddRole | NodeType::RemoveRole => &["roleId", "userId", "reason"],
      NodeType::Logger => &["message"],
      _ => &[],
    }
  }
}

impl fmt::Display for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
