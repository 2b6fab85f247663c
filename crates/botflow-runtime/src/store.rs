//! Persistent variables shared across runs.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Who a persistent variable belongs to.
///
/// Run-local state lives in the execution context's variables and never
/// reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum VariableScope {
  User(String),
  Guild(String),
}

impl fmt::Display for VariableScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VariableScope::User(id) => write!(f, "user:{}", id),
      VariableScope::Guild(id) => write!(f, "guild:{}", id),
    }
  }
}

/// Trait for persistent variable storage.
///
/// Each call is an independent atomic operation; concurrent runs writing the
/// same key are the backend's concern.
#[async_trait]
pub trait VariableStore: Send + Sync {
  /// Get a value, or `None` if it was never set.
  async fn get(&self, scope: &VariableScope, key: &str) -> Result<Option<Value>, StoreError>;

  /// Set a value, replacing any previous one.
  async fn set(&self, scope: &VariableScope, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-memory variable store.
///
/// Suitable for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryVariableStore {
  data: RwLock<HashMap<(VariableScope, String), Value>>,
}

impl MemoryVariableStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl VariableStore for MemoryVariableStore {
  async fn get(&self, scope: &VariableScope, key: &str) -> Result<Option<Value>, StoreError> {
    let data = self.data.read().await;
    Ok(data.get(&(scope.clone(), key.to_string())).cloned())
  }

  async fn set(&self, scope: &VariableScope, key: &str, value: Value) -> Result<(), StoreError> {
    let mut data = self.data.write().await;
    data.insert((scope.clone(), key.to_string()), value);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_memory_variable_store() {
    let store = MemoryVariableStore::new();
    let alice = VariableScope::User("alice".to_string());
    let guild = VariableScope::Guild("alice".to_string());

    assert_eq!(store.get(&alice, "points").await.unwrap(), None);

    store.set(&alice, "points", json!(5)).await.unwrap();
    assert_eq!(store.get(&alice, "points").await.unwrap(), Some(json!(5)));
    assert_eq!(store.get(&guild, "points").await.unwrap(), None);

    store.set(&alice, "points", json!(6)).await.unwrap();
    assert_eq!(store.get(&alice, "points").await.unwrap(), Some(json!(6)));
  }

  #[test]
  fn test_scope_display() {
    assert_eq!(VariableScope::Guild("g1".to_string()).to_string(), "guild:g1");
  }
}
