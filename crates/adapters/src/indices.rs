// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-organization index names.

use fm_core::OrgId;

pub fn agents(org: &OrgId) -> String {
    format!("{org}.agents")
}

pub fn jobs(org: &OrgId) -> String {
    format!("{org}.jobs")
}

pub fn config(org: &OrgId) -> String {
    format!("{org}.config")
}
