//! Per-loop iteration state.
//!
//! Each Loop node moves through `Idle -> Running { index } -> Done`. Arrival
//! over a re-entry edge advances a running loop; any other arrival starts it
//! over, which is how an inner loop restarts for every item of an outer one.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum LoopState {
  #[default]
  Idle,
  Running {
    items: Vec<Value>,
    index: usize,
  },
  Done,
}

/// What the loop node does on this visit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoopStep {
  /// Run the body for `item`.
  Item { index: usize, item: Value },
  /// Every item was visited.
  Finished,
  /// The per-loop iteration limit stopped the loop early.
  CapReached,
}

/// Loop states of one run, keyed by loop node id.
#[derive(Debug, Default)]
pub(crate) struct LoopTable {
  states: HashMap<String, LoopState>,
}

impl LoopTable {
  /// Start the loop over `items`.
  pub fn start(&mut self, node_id: &str, items: Vec<Value>, max_iterations: usize) -> LoopStep {
    let step = match items.first() {
      None => LoopStep::Finished,
      Some(_) if max_iterations == 0 => LoopStep::CapReached,
      Some(first) => LoopStep::Item {
        index: 0,
        item: first.clone(),
      },
    };
    let state = match step {
      LoopStep::Item { .. } => LoopState::Running { items, index: 0 },
      _ => LoopState::Done,
    };
    self.states.insert(node_id.to_string(), state);
    step
  }

  /// Advance a running loop. `None` if the loop is not running.
  pub fn advance(&mut self, node_id: &str, max_iterations: usize) -> Option<LoopStep> {
    let state = self.states.get_mut(node_id)?;
    let LoopState::Running { items, index } = state else {
      return None;
    };

    let next = *index + 1;
    let step = if next >= items.len() {
      LoopStep::Finished
    } else if next >= max_iterations {
      LoopStep::CapReached
    } else {
      *index = next;
      return Some(LoopStep::Item {
        index: next,
        item: items[next].clone(),
      });
    };
    *state = LoopState::Done;
    Some(step)
  }

  #[cfg(test)]
  pub fn state(&self, node_id: &str) -> LoopState {
    self.states.get(node_id).cloned().unwrap_or_default()
  }
}

/// Coerce a resolved list expression into items.
///
/// Lists are used as-is, `undefined` and `null` are empty, text holding a
/// JSON array is parsed, other text is split on commas, and any other value
/// is a single item.
pub(crate) fn to_items(value: Option<Value>) -> Vec<Value> {
  match value {
    None | Some(Value::Null) => Vec::new(),
    Some(Value::Array(items)) => items,
    Some(Value::String(text)) => {
      let trimmed = text.trim();
      if trimmed.starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str(trimmed) {
          return items;
        }
      }
      trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Value::String(part.to_string()))
        .collect()
    }
    Some(other) => vec![other],
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_walks_items_then_finishes() {
    let mut loops = LoopTable::default();
    assert_eq!(loops.state("l"), LoopState::Idle);

    let step = loops.start("l", vec![json!("a"), json!("b")], 50);
    assert_eq!(step, LoopStep::Item { index: 0, item: json!("a") });
    assert_eq!(
      loops.advance("l", 50),
      Some(LoopStep::Item { index: 1, item: json!("b") })
    );
    assert_eq!(loops.advance("l", 50), Some(LoopStep::Finished));
    assert_eq!(loops.state("l"), LoopState::Done);
    assert_eq!(loops.advance("l", 50), None);
  }

  #[test]
  fn test_empty_list_finishes_immediately() {
    let mut loops = LoopTable::default();
    assert_eq!(loops.start("l", vec![], 50), LoopStep::Finished);
    assert_eq!(loops.advance("l", 50), None);
  }

  #[test]
  fn test_cap_stops_early() {
    let mut loops = LoopTable::default();
    let items: Vec<Value> = (0..10).map(Value::from).collect();
    assert!(matches!(loops.start("l", items, 2), LoopStep::Item { index: 0, .. }));
    assert!(matches!(loops.advance("l", 2), Some(LoopStep::Item { index: 1, .. })));
    assert_eq!(loops.advance("l", 2), Some(LoopStep::CapReached));
  }

  #[test]
  fn test_exact_cap_completes_normally() {
    let mut loops = LoopTable::default();
    loops.start("l", vec![json!(1), json!(2)], 2);
    loops.advance("l", 2);
    assert_eq!(loops.advance("l", 2), Some(LoopStep::Finished));
  }

  #[test]
  fn test_restart_resets_index() {
    let mut loops = LoopTable::default();
    loops.start("l", vec![json!(1), json!(2)], 50);
    loops.advance("l", 50);
    let step = loops.start("l", vec![json!(9)], 50);
    assert_eq!(step, LoopStep::Item { index: 0, item: json!(9) });
  }

  #[test]
  fn test_to_items() {
    assert_eq!(to_items(None), Vec::<Value>::new());
    assert_eq!(to_items(Some(json!(["a", 1]))), vec![json!("a"), json!(1)]);
    assert_eq!(to_items(Some(json!("a, b ,,c"))), vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(to_items(Some(json!(r#"["x","y"]"#))), vec![json!("x"), json!("y")]);
    assert_eq!(to_items(Some(json!(7))), vec![json!(7)]);
    assert_eq!(to_items(Some(json!(""))), Vec::<Value>::new());
  }
}
