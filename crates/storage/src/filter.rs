// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed query filters.
//!
//! Filters describe *which* documents match without committing to a query
//! language; a store backend translates them (or evaluates them directly,
//! as the in-memory store does). Fields are addressed by dotted path.

use serde_json::Value;

/// Bound for a numeric range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    AtLeast(u64),
    AtMost(u64),
    Below(u64),
}

impl RangeBound {
    fn contains(self, n: u64) -> bool {
        match self {
            RangeBound::AtLeast(min) => n >= min,
            RangeBound::AtMost(max) => n <= max,
            RangeBound::Below(limit) => n < limit,
        }
    }
}

/// Document predicate.
///
/// `Term`, `AnyOf` and `Range` never match a document that lacks the field;
/// combine with `Exists` to treat a missing field as a default.
/// `Term` and `AnyOf` match a scalar field by equality and an array field
/// when any element is equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Term { field: String, value: Value },
    AnyOf { field: String, values: Vec<Value> },
    Range { field: String, bound: RangeBound },
    Exists { field: String },
}

impl Filter {
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Filter::Term { field: field.to_string(), value: value.into() }
    }

    pub fn any_of<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::AnyOf { field: field.to_string(), values: values.into_iter().map(Into::into).collect() }
    }

    pub fn range(field: &str, bound: RangeBound) -> Self {
        Filter::Range { field: field.to_string(), bound }
    }

    pub fn exists(field: &str) -> Self {
        Filter::Exists { field: field.to_string() }
    }

    /// `Range` that also matches documents without the field, for counters
    /// whose absence means zero.
    pub fn range_or_missing(field: &str, bound: RangeBound) -> Self {
        Filter::Or(vec![Filter::range(field, bound), Filter::not(Filter::exists(field))])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Evaluate the filter against a JSON document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
            Filter::Term { field, value } => {
                lookup(doc, field).is_some_and(|found| contains_value(found, value))
            }
            Filter::AnyOf { field, values } => lookup(doc, field)
                .is_some_and(|found| values.iter().any(|v| contains_value(found, v))),
            Filter::Range { field, bound } => {
                lookup(doc, field).and_then(Value::as_u64).is_some_and(|n| bound.contains(n))
            }
            Filter::Exists { field } => lookup(doc, field).is_some(),
        }
    }
}

fn contains_value(found: &Value, wanted: &Value) -> bool {
    match found {
        Value::Array(items) => items.contains(wanted),
        scalar => scalar == wanted,
    }
}

/// Resolve a dotted path inside a document.
pub(crate) fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment)).filter(|v| !v.is_null())
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
