// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-storage: document store abstraction
//!
//! All durable control-plane state lives in an external, eventually
//! consistent document store. This crate defines the narrow surface the
//! control plane needs from it (get/set/delete, paged filtered queries, and
//! conditional bulk updates) plus an in-memory implementation.

mod filter;
mod memory;
mod mutation;
mod store;

pub use filter::{Filter, RangeBound};
pub use memory::MemoryStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{StoreOp, UpdateCall};
pub use mutation::Mutation;
pub use store::{Document, DocumentStore, PageRequest, QueryPage, StoreError};
