// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the collaborators the Foreman reconciles against

pub mod directory;
pub mod dispatch;
pub mod indices;
pub mod policy;
pub mod registry;

pub use directory::{AgentDirectory, AgentPages, DirectoryError, StoreAgentDirectory};
pub use dispatch::{DispatchError, Launcher, Messenger};
pub use policy::{PolicyError, PolicySource, StorePolicySource};
pub use registry::{JobRegistry, NewJob, RegistryError, StoreJobRegistry};

#[cfg(any(test, feature = "test-support"))]
pub use dispatch::{FakeLauncher, FakeMessenger, LaunchCall, MessageCall};
