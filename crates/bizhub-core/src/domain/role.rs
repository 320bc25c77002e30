// ============================================================================
// BizHub Core - Roles & Actor
// File: crates/bizhub-core/src/domain/role.rs
// Description: User roles and the authenticated actor performing an operation
// ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to every user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Agent,
    User,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [UserRole::Admin, UserRole::Manager, UserRole::Agent, UserRole::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
            UserRole::Agent => "AGENT",
            UserRole::User => "USER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "MANAGER" => Some(UserRole::Manager),
            "AGENT" => Some(UserRole::Agent),
            "USER" => Some(UserRole::User),
            _ => None,
        }
    }

    /// Staff handle complaints on behalf of customers.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager | UserRole::Agent)
    }

    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user on whose behalf a service call runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!(UserRole::from_str("manager"), Some(UserRole::Manager));
        assert_eq!(UserRole::from_str("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("owner"), None);
    }

    #[test]
    fn test_staff_roles() {
        assert!(UserRole::Agent.is_staff());
        assert!(!UserRole::User.is_staff());
        assert!(!UserRole::Agent.is_manager_or_admin());
    }
}
