//! Caller identity
//!
//! Authentication lives upstream: an API gateway verifies credentials and
//! injects `x-user-id` / `x-user-role` headers. This module only extracts
//! and types that identity; no credential verification happens here.

mod extractor;

use shared::error::{AppError, AppResult};
use std::str::FromStr;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Caller role as asserted by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin-only guard
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::admin_required())
        }
    }

    /// Owner-or-admin guard for resources scoped to a user
    pub fn require_owner(&self, owner_id: i64, action: &str) -> AppResult<()> {
        if self.id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Not authorized to {action}"
            )))
        }
    }
}
