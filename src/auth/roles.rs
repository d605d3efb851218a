// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// - `Admin` - the operator account; may mint payment tokens and delete users
/// - `Client` - everyone else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl Role {
    /// Role of an account, decided by its username.
    pub fn for_username(username: &str, operator_username: &str) -> Role {
        if username == operator_username {
            Role::Admin
        } else {
            Role::Client
        }
    }

    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Client, Role::Client) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Client => write!(f, "client"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_username_is_admin() {
        assert_eq!(Role::for_username("admin", "admin"), Role::Admin);
        assert_eq!(Role::for_username("alice", "admin"), Role::Client);
        assert_eq!(Role::for_username("Admin", "admin"), Role::Client);
    }

    #[test]
    fn privileges() {
        assert!(Role::Admin.has_privilege(Role::Client));
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(!Role::Client.has_privilege(Role::Admin));
        assert_eq!(Role::default(), Role::Client);
    }
}
