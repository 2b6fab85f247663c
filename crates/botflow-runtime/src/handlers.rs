//! Host-supplied side effects.

use std::collections::BTreeMap;

use async_trait::async_trait;
use botflow_config::{ButtonDef, LogLevel, SelectMenuDef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HandlerError;

/// Reply to the invoking interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
  pub content: String,
  pub ephemeral: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
  pub channel_id: String,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
  pub user_id: String,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedFieldContent {
  pub name: String,
  pub value: String,
  pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embed {
  pub channel_id: String,
  pub title: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<u32>,
  pub footer: String,
  pub fields: Vec<EmbedFieldContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
  pub user_id: String,
  pub role_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestSpec {
  pub method: String,
  pub url: String,
  pub headers: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
  pub status: u16,
  /// Parsed JSON when the response was JSON, otherwise the body text.
  pub body: Value,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// A message with buttons or select menus awaiting one user response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPrompt {
  pub content: String,
  pub buttons: Vec<ButtonDef>,
  pub select_menus: Vec<SelectMenuDef>,
  /// How long the host should wait for a response.
  pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InteractionResponse {
  #[serde(rename_all = "camelCase")]
  Button { id: String },
  #[serde(rename_all = "camelCase")]
  Select { menu_id: String, value: String },
}

impl InteractionResponse {
  /// The output handle this response routes to.
  pub fn handle(&self) -> String {
    match self {
      InteractionResponse::Button { id } => format!("button:{}", id),
      InteractionResponse::Select { menu_id, value } => format!("select:{}:{}", menu_id, value),
    }
  }
}

/// Side effects a workflow can request from its host.
///
/// Each call is one action against the outside world. The interpreter awaits
/// it before moving on and never retries a failed call.
#[async_trait]
pub trait ActionHandlers: Send + Sync {
  async fn reply(&self, reply: Reply) -> Result<(), HandlerError>;

  async fn send_channel(&self, message: ChannelMessage) -> Result<(), HandlerError>;

  async fn send_dm(&self, message: DirectMessage) -> Result<(), HandlerError>;

  async fn send_embed(&self, embed: Embed) -> Result<(), HandlerError>;

  async fn add_role(&self, request: RoleRequest) -> Result<(), HandlerError>;

  async fn remove_role(&self, request: RoleRequest) -> Result<(), HandlerError>;

  async fn log(&self, level: LogLevel, message: &str) -> Result<(), HandlerError>;

  async fn http_request(&self, request: HttpRequestSpec) -> Result<HttpResponse, HandlerError>;

  /// Send an interactive message and wait for the first response.
  ///
  /// `Ok(None)` means nobody responded in time. Hosts without interactive
  /// components keep the default.
  async fn await_interaction(
    &self,
    _prompt: InteractionPrompt,
  ) -> Result<Option<InteractionResponse>, HandlerError> {
    Ok(None)
  }
}
