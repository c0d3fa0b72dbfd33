// SPDX-License-Identifier: MIT

//! Workflow state with per-field reducer merge
//!
//! Nodes return partial updates; the executor merges them through the
//! reducer table declared when the state is constructed. Merging a whole
//! update is one indivisible operation on the state, which is what makes
//! concurrent specialist completions safe.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// How incoming values combine with a field's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Replace the value (last write wins)
    Overwrite,
    /// Concatenate onto an array (ordered multiset; duplicates allowed)
    Append,
    /// Key-wise union into an object
    Merge,
}

/// A partial state produced by one node: only the fields it touched
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    entries: Vec<(String, Value)>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the update (builder style)
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// The single mutable-by-replacement context threaded through the graph
#[derive(Debug, Clone)]
pub struct WorkflowState {
    fields: HashMap<String, Value>,
    reducers: HashMap<String, Reducer>,
}

impl WorkflowState {
    /// Create a state with a fixed reducer table.
    ///
    /// The table is identical on every path through the graph; fields not
    /// listed fall back to overwrite.
    pub fn with_reducers(table: &[(&str, Reducer)]) -> Self {
        Self {
            fields: HashMap::new(),
            reducers: table
                .iter()
                .map(|(name, r)| (name.to_string(), *r))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            reducers: HashMap::new(),
        }
    }

    /// Merge a partial update, applying each field's declared reducer.
    /// Fields absent from the update are left untouched.
    pub fn apply(&mut self, update: StateUpdate) {
        for (key, value) in update.entries {
            self.apply_field(&key, value);
        }
    }

    fn apply_field(&mut self, key: &str, value: Value) {
        let reducer = self.reducers.get(key).copied().unwrap_or(Reducer::Overwrite);

        match reducer {
            Reducer::Overwrite => {
                self.fields.insert(key.to_string(), value);
            }
            Reducer::Append => {
                let arr = self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Array(vec![]));
                if let Value::Array(a) = arr {
                    match value {
                        Value::Array(new_items) => a.extend(new_items),
                        other => a.push(other),
                    }
                }
            }
            Reducer::Merge => {
                let current = self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Object(Map::new()));
                if let (Value::Object(current_obj), Value::Object(new_obj)) = (current, value) {
                    for (k, v) in new_obj {
                        current_obj.insert(k, v);
                    }
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field as a string slice, if it is one
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// Convert state to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
