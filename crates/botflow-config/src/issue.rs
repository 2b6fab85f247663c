use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
  /// The graph cannot run as authored.
  Error,
  /// The graph runs but may not behave as intended.
  Warning,
}

/// A single finding from static validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
  pub level: IssueLevel,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_id: Option<String>,
}

impl ValidationIssue {
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: IssueLevel::Error,
      message: message.into(),
      node_id: None,
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self {
      level: IssueLevel::Warning,
      message: message.into(),
      node_id: None,
    }
  }

  /// Scope the issue to a node.
  pub fn at(mut self, node_id: impl Into<String>) -> Self {
    self.node_id = Some(node_id.into());
    self
  }

  pub fn is_error(&self) -> bool {
    self.level == IssueLevel::Error
  }
}

impl fmt::Display for ValidationIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let level = match self.level {
      IssueLevel::Error => "error",
      IssueLevel::Warning => "warning",
    };
    match &self.node_id {
      Some(node_id) => write!(f, "{}: [{}] {}", level, node_id, self.message),
      None => write!(f, "{}: {}", level, self.message),
    }
  }
}
