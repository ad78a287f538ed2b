// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role checks.

use super::claims::IdentityContext;
use super::error::AuthError;
use super::roles::RoleSet;

/// True iff the context holds at least one of `allowed`.
pub fn require_role(context: &IdentityContext, allowed: &RoleSet) -> bool {
    context.roles.intersects(allowed)
}

/// Like [`require_role`], but returns the 403 error with both role sets.
pub fn authorize(context: &IdentityContext, allowed: &RoleSet) -> Result<(), AuthError> {
    if require_role(context, allowed) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole {
            required: allowed.clone(),
            actual: context.roles.clone(),
        })
    }
}
