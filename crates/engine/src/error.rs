// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fm_adapters::{DirectoryError, PolicyError, RegistryError};
use thiserror::Error;

/// Errors that abandon a tick.
///
/// Failures confined to one job or one monitoring group are logged and
/// counted in the tick report instead.
#[derive(Debug, Error)]
pub enum ForemanError {
    #[error("agent directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("job registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("monitoring policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("cancelled")]
    Cancelled,
}
