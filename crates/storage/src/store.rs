// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::filter::Filter;
use crate::mutation::Mutation;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from document store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document {index}/{id} is not a JSON object")]
    NotAnObject { index: String, id: String },

    #[error("field '{field}' is not {expected}")]
    FieldType { field: String, expected: &'static str },

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub source: Value,
}

/// Cursor-based page request. Results are ordered by document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    /// Return only documents whose id sorts after this one
    pub after: Option<String>,
}

impl PageRequest {
    pub fn first(size: usize) -> Self {
        Self { size, after: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub hits: Vec<Document>,
    /// Cursor for the next page; `None` when exhausted
    pub next: Option<PageRequest>,
}

/// Eventually consistent document store.
///
/// A write is not guaranteed to be visible to a query issued immediately
/// afterwards; callers must not read-then-write individual documents and
/// should express changes as [`Mutation`]s applied by `update_by_ids`.
#[async_trait]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    async fn get(&self, index: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, index: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Returns whether a document was removed
    async fn delete(&self, index: &str, id: &str) -> Result<bool, StoreError>;

    async fn query(
        &self,
        index: &str,
        filter: &Filter,
        page: &PageRequest,
    ) -> Result<QueryPage, StoreError>;

    /// Apply `mutations` to every existing document whose id is in `ids`.
    ///
    /// Each document is updated atomically; there is no atomicity across
    /// documents. Returns the number of documents updated.
    async fn update_by_ids(
        &self,
        index: &str,
        ids: &[String],
        mutations: &[Mutation],
    ) -> Result<u64, StoreError>;
}
