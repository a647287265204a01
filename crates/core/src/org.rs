// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organization (tenant) identifier.

crate::define_id! {
    /// Tenant that owns a disjoint set of agents, jobs and policies.
    ///
    /// Every organization gets its own reconciliation loop.
    pub struct OrgId("org-");
}

impl OrgId {
    /// The default organization present in every deployment.
    pub fn root() -> Self {
        Self::new("root")
    }
}
