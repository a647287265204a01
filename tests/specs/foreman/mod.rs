// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod convergence;
mod expiry;
mod jobs;
mod monitoring;
