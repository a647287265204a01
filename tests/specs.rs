// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioural specs for the Foreman, driven over the in-memory store.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/foreman/mod.rs"]
mod foreman;
