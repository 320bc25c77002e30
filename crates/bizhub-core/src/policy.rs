// ============================================================================
// BizHub Core - Role Permissions
// File: crates/bizhub-core/src/policy.rs
// Description: Static role x resource x action permission map
// ============================================================================

use serde::Serialize;
use tracing::warn;

use crate::domain::{Actor, UserRole};
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Contract,
    Complaint,
    Service,
    Provider,
    Humanitarian,
    Parking,
    Report,
    User,
    Analytics,
    ActivityLog,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Contract,
        Resource::Complaint,
        Resource::Service,
        Resource::Provider,
        Resource::Humanitarian,
        Resource::Parking,
        Resource::Report,
        Resource::User,
        Resource::Analytics,
        Resource::ActivityLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Contract => "contract",
            Resource::Complaint => "complaint",
            Resource::Service => "service",
            Resource::Provider => "provider",
            Resource::Humanitarian => "humanitarian",
            Resource::Parking => "parking",
            Resource::Report => "report",
            Resource::User => "user",
            Resource::Analytics => "analytics",
            Resource::ActivityLog => "activity_log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

pub fn is_allowed(role: UserRole, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;

    match role {
        UserRole::Admin => match resource {
            Analytics | ActivityLog => action == View,
            _ => true,
        },
        UserRole::Manager => match resource {
            Analytics | User => action == View,
            ActivityLog => false,
            _ => action != Delete,
        },
        UserRole::Agent => match resource {
            Complaint => action != Delete,
            Analytics | ActivityLog => false,
            _ => action == View,
        },
        UserRole::User => match resource {
            Complaint => matches!(action, View | Create),
            Service | Provider | Humanitarian | Parking => action == View,
            _ => false,
        },
    }
}

/// Fails with `Forbidden` unless the actor's role grants `action` on `resource`.
pub fn require(actor: &Actor, resource: Resource, action: Action) -> Result<(), DomainError> {
    if is_allowed(actor.role, resource, action) {
        return Ok(());
    }
    warn!(
        user_id = %actor.user_id,
        role = actor.role.as_str(),
        "Permission denied: {}:{}",
        resource.as_str(),
        action.as_str()
    );
    Err(DomainError::forbidden(format!(
        "{} cannot {} {}",
        actor.role.as_str(),
        action.as_str(),
        resource.as_str()
    )))
}

/// Fails with `Forbidden` unless the actor holds one of `roles`. Used where
/// an operation is restricted beyond the resource map, e.g. deletions that
/// managers may perform on renewals.
pub fn require_role(actor: &Actor, roles: &[UserRole], operation: &str) -> Result<(), DomainError> {
    if roles.contains(&actor.role) {
        return Ok(());
    }
    warn!(user_id = %actor.user_id, role = actor.role.as_str(), "Permission denied: {}", operation);
    Err(DomainError::forbidden(format!("{} cannot {}", actor.role.as_str(), operation)))
}

/// Granted permissions as `resource:action` strings, for clients that hide
/// controls the user cannot use.
pub fn granted(role: UserRole) -> Vec<String> {
    Resource::ALL
        .iter()
        .flat_map(|resource| {
            Action::ALL
                .iter()
                .filter(move |action| is_allowed(role, *resource, **action))
                .map(move |action| format!("{}:{}", resource.as_str(), action.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use Action::*;
    use Resource::*;

    #[test]
    fn test_admin_has_full_access_except_read_only_resources() {
        for resource in [Contract, Complaint, Service, Provider, Humanitarian, Parking, Report, User] {
            for action in Action::ALL {
                assert!(is_allowed(UserRole::Admin, resource, action));
            }
        }
        assert!(is_allowed(UserRole::Admin, Analytics, View));
        assert!(!is_allowed(UserRole::Admin, Analytics, Delete));
        assert!(is_allowed(UserRole::Admin, ActivityLog, View));
    }

    #[test]
    fn test_manager_cannot_delete() {
        assert!(is_allowed(UserRole::Manager, Contract, Update));
        assert!(!is_allowed(UserRole::Manager, Contract, Delete));
        assert!(is_allowed(UserRole::Manager, User, View));
        assert!(!is_allowed(UserRole::Manager, User, Create));
        assert!(!is_allowed(UserRole::Manager, ActivityLog, View));
    }

    #[test]
    fn test_agent_works_complaints_only() {
        assert!(is_allowed(UserRole::Agent, Complaint, Update));
        assert!(!is_allowed(UserRole::Agent, Complaint, Delete));
        assert!(is_allowed(UserRole::Agent, Contract, View));
        assert!(!is_allowed(UserRole::Agent, Contract, Update));
        assert!(!is_allowed(UserRole::Agent, Analytics, View));
    }

    #[test]
    fn test_user_permissions() {
        assert!(is_allowed(UserRole::User, Complaint, Create));
        assert!(!is_allowed(UserRole::User, Complaint, Update));
        assert!(is_allowed(UserRole::User, Provider, View));
        assert!(!is_allowed(UserRole::User, Contract, View));
        assert!(!is_allowed(UserRole::User, Report, View));
    }

    #[test]
    fn test_require_returns_forbidden() {
        let actor = Actor::new(Uuid::new_v4(), UserRole::Agent);
        let err = require(&actor, Contract, Delete).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn test_require_role() {
        let manager = Actor::new(Uuid::new_v4(), UserRole::Manager);
        assert!(require_role(&manager, &[UserRole::Admin, UserRole::Manager], "delete renewals").is_ok());
        assert!(require_role(&manager, &[UserRole::Admin], "view role statistics").is_err());
    }

    #[test]
    fn test_granted_list() {
        let perms = granted(UserRole::User);
        assert!(perms.contains(&"complaint:create".to_string()));
        assert!(!perms.contains(&"contract:view".to_string()));
        assert_eq!(granted(UserRole::Admin).len(), 8 * 4 + 2);
    }
}
