use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use botflow_runtime::{StoreError, VariableScope, VariableStore};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

type Document = BTreeMap<String, Map<String, Value>>;

/// Persistent variables kept in a single JSON file, grouped by scope.
///
/// The whole file is read and rewritten on every call. Writes go through a
/// temporary file and a rename so a crash never leaves half a document.
pub struct FileVariableStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileVariableStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lock: Mutex::new(()),
    }
  }

  async fn load(&self) -> Result<Document, StoreError> {
    match tokio::fs::read_to_string(&self.path).await {
      Ok(content) if content.trim().is_empty() => Ok(Document::new()),
      Ok(content) => Ok(serde_json::from_str(&content)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
      Err(e) => Err(e.into()),
    }
  }

  async fn save(&self, document: &Document) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    debug!(path = %self.path.display(), scopes = document.len(), "variables_saved");
    Ok(())
  }
}

#[async_trait]
impl VariableStore for FileVariableStore {
  async fn get(&self, scope: &VariableScope, key: &str) -> Result<Option<Value>, StoreError> {
    let _guard = self.lock.lock().await;
    let document = self.load().await?;
    Ok(
      document
        .get(&scope.to_string())
        .and_then(|vars| vars.get(key))
        .cloned(),
    )
  }

  async fn set(&self, scope: &VariableScope, key: &str, value: Value) -> Result<(), StoreError> {
    let _guard = self.lock.lock().await;
    let mut document = self.load().await?;
    document
      .entry(scope.to_string())
      .or_default()
      .insert(key.to_string(), value);
    self.save(&document).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_values_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("variables.json");
    let user = VariableScope::User("u1".to_string());

    let store = FileVariableStore::new(&path);
    assert_eq!(store.get(&user, "points").await.unwrap(), None);
    store.set(&user, "points", json!(3)).await.unwrap();

    let reopened = FileVariableStore::new(&path);
    assert_eq!(reopened.get(&user, "points").await.unwrap(), Some(json!(3)));
    assert_eq!(
      reopened
        .get(&VariableScope::Guild("u1".to_string()), "points")
        .await
        .unwrap(),
      None
    );

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, json!({ "user:u1": { "points": 3 } }));
  }

  #[tokio::test]
  async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("variables.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileVariableStore::new(&path);
    let err = store
      .get(&VariableScope::User("u1".to_string()), "k")
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
  }
}
