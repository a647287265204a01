// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-engine: the Foreman reconciliation engine
//!
//! Each tick computes a [`Plan`] from current directory and registry state,
//! executes it through the batch dispatchers, and discards it. Nothing
//! carries over between ticks except the markers written to agent records.

mod config;
mod error;
mod foreman;
mod membership;
mod monitoring;
mod plan;
mod supervisor;

pub use config::{ConfigError, ForemanConfig};
pub use error::ForemanError;
pub use foreman::{store_deps, Foreman, ForemanDeps, StoreForeman, TickReport};
pub use plan::Plan;
pub use supervisor::ForemanSupervisor;

#[cfg(test)]
mod test_helpers;
