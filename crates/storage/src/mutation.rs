// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field mutations for conditional bulk updates.
//!
//! A mutation states *what* changes; how a backend performs it (server-side
//! script or per-document conditional write) is its own business.

use crate::store::StoreError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Overwrite a field
    Set { field: String, value: Value },
    /// Append to an array field only if the value is not already present
    AddToSet { field: String, value: Value },
    /// Add to a numeric field (missing counts as zero)
    Increment { field: String, by: u64 },
}

impl Mutation {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Mutation::Set { field: field.to_string(), value: value.into() }
    }

    pub fn add_to_set(field: &str, value: impl Into<Value>) -> Self {
        Mutation::AddToSet { field: field.to_string(), value: value.into() }
    }

    pub fn increment(field: &str, by: u64) -> Self {
        Mutation::Increment { field: field.to_string(), by }
    }

    fn field(&self) -> &str {
        match self {
            Mutation::Set { field, .. }
            | Mutation::AddToSet { field, .. }
            | Mutation::Increment { field, .. } => field,
        }
    }

    /// Apply to a document in place.
    pub fn apply(&self, doc: &mut Value) -> Result<(), StoreError> {
        let slot = slot_mut(doc, self.field())?;
        match self {
            Mutation::Set { value, .. } => *slot = value.clone(),
            Mutation::AddToSet { field, value } => {
                if slot.is_null() {
                    *slot = Value::Array(Vec::new());
                }
                let Value::Array(items) = slot else {
                    return Err(StoreError::FieldType { field: field.clone(), expected: "array" });
                };
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
            Mutation::Increment { field, by } => {
                let current = match &*slot {
                    Value::Null => 0,
                    other => other.as_u64().ok_or_else(|| StoreError::FieldType {
                        field: field.clone(),
                        expected: "unsigned integer",
                    })?,
                };
                *slot = Value::from(current.saturating_add(*by));
            }
        }
        Ok(())
    }
}

/// Find (creating intermediate objects) the slot for a dotted path.
fn slot_mut<'a>(doc: &'a mut Value, path: &str) -> Result<&'a mut Value, StoreError> {
    let mut node = doc;
    for segment in path.split('.') {
        if node.is_null() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return Err(StoreError::FieldType { field: path.to_string(), expected: "object" });
        };
        node = map.entry(segment).or_insert(Value::Null);
    }
    Ok(node)
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
