// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory document store.
//!
//! Strongly consistent (every write is visible to the next query), which is
//! a legal special case of the eventual consistency callers must tolerate.

use crate::filter::Filter;
use crate::mutation::Mutation;
use crate::store::{Document, DocumentStore, PageRequest, QueryPage, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Store operation kinds, used for fault injection.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Delete,
    Query,
    Update,
}

/// Recorded `update_by_ids` call
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub index: String,
    pub ids: Vec<String>,
    pub mutations: Vec<Mutation>,
}

#[derive(Default)]
struct MemoryState {
    indices: HashMap<String, BTreeMap<String, Value>>,
    #[cfg(any(test, feature = "test-support"))]
    faults: Vec<StoreOp>,
    #[cfg(any(test, feature = "test-support"))]
    updates: Vec<UpdateCall>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in an index
    pub fn len(&self, index: &str) -> usize {
        self.inner.lock().indices.get(index).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, index: &str) -> bool {
        self.len(index) == 0
    }
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryStore {
    /// Make the next call of kind `op` fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, op: StoreOp) {
        self.inner.lock().faults.push(op);
    }

    /// All `update_by_ids` calls made so far
    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.inner.lock().updates.clone()
    }

    fn check_fault(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        match state.faults.iter().position(|f| *f == op) {
            Some(pos) => {
                state.faults.remove(pos);
                Err(StoreError::Unavailable(format!("injected {op:?} failure")))
            }
            None => Ok(()),
        }
    }
}

macro_rules! check_fault {
    ($store:expr, $op:ident) => {
        #[cfg(any(test, feature = "test-support"))]
        $store.check_fault(StoreOp::$op)?;
    };
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, index: &str, id: &str) -> Result<Option<Value>, StoreError> {
        check_fault!(self, Get);
        let state = self.inner.lock();
        Ok(state.indices.get(index).and_then(|docs| docs.get(id)).cloned())
    }

    async fn set(&self, index: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        if !doc.is_object() {
            return Err(StoreError::NotAnObject { index: index.to_string(), id: id.to_string() });
        }
        check_fault!(self, Set);
        let mut state = self.inner.lock();
        state.indices.entry(index.to_string()).or_default().insert(id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<bool, StoreError> {
        check_fault!(self, Delete);
        let mut state = self.inner.lock();
        Ok(state.indices.get_mut(index).is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn query(
        &self,
        index: &str,
        filter: &Filter,
        page: &PageRequest,
    ) -> Result<QueryPage, StoreError> {
        check_fault!(self, Query);
        let state = self.inner.lock();
        let Some(docs) = state.indices.get(index) else {
            return Ok(QueryPage::default());
        };
        let size = page.size.max(1);
        let start = match &page.after {
            Some(after) => std::ops::Bound::Excluded(after.clone()),
            None => std::ops::Bound::Unbounded,
        };
        let mut matching = docs
            .range((start, std::ops::Bound::Unbounded))
            .filter(|(_, source)| filter.matches(source));

        let hits: Vec<Document> = matching
            .by_ref()
            .take(size)
            .map(|(id, source)| Document { id: id.clone(), source: source.clone() })
            .collect();
        let next = match (hits.last(), matching.next()) {
            (Some(last), Some(_)) => Some(PageRequest { size, after: Some(last.id.clone()) }),
            _ => None,
        };
        Ok(QueryPage { hits, next })
    }

    async fn update_by_ids(
        &self,
        index: &str,
        ids: &[String],
        mutations: &[Mutation],
    ) -> Result<u64, StoreError> {
        check_fault!(self, Update);
        let mut state = self.inner.lock();
        #[cfg(any(test, feature = "test-support"))]
        state.updates.push(UpdateCall {
            index: index.to_string(),
            ids: ids.to_vec(),
            mutations: mutations.to_vec(),
        });

        let Some(docs) = state.indices.get_mut(index) else {
            return Ok(0);
        };
        let mut updated = 0;
        for id in ids {
            let Some(doc) = docs.get_mut(id) else {
                tracing::debug!(index, id, "update skipped missing document");
                continue;
            };
            let mut next = doc.clone();
            for mutation in mutations {
                mutation.apply(&mut next)?;
            }
            *doc = next;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
