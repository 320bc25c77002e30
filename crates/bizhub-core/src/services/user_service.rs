// ============================================================================
// BizHub Core - User Service
// File: crates/bizhub-core/src/services/user_service.rs
// ============================================================================
//! User administration: creation, roles and activation

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use bizhub_security::PasswordService;
use bizhub_shared::utils::normalize_email;
use bizhub_shared::{Page, Pagination};

use crate::domain::{ActivityAction, ActivityLog, Actor, EntityKind, Severity, User, UserFilter, UserRole};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ActivityRecorder, UserRepository};
use crate::services::UserInfo;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleStatistics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub by_role: BTreeMap<String, usize>,
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, activity: Arc<dyn ActivityRecorder>) -> Self {
        Self { user_repo, activity }
    }

    pub async fn create(&self, actor: &Actor, input: CreateUserInput) -> Result<UserInfo, DomainError> {
        policy::require(actor, Resource::User, Action::Create)?;

        // 1. Validate input
        input.validate()?;
        let email = normalize_email(&input.email);

        // 2. Check email uniqueness
        if self.user_repo.find_by_email(&email).await?.is_some() {
            warn!("User creation rejected, email taken: {}", bizhub_shared::utils::mask_email(&email));
            return Err(DomainError::EmailAlreadyExists(email));
        }

        // 3. Password policy, then hash
        PasswordService::check_strength(&input.password, &[input.name.as_str(), email.as_str()])?;
        let password_hash = PasswordService::hash(&input.password)?;

        // 4. Persist
        let user = User::new(input.name, email, password_hash, input.role)?;
        let created = self.user_repo.create(&user).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::UserCreated, EntityKind::User)
                .entity_id(created.id)
                .user(actor.user_id)
                .json(json!({ "role": created.role.as_str() }))
                .build(),
        );
        info!("User created: {} ({})", created.id, created.role);

        Ok(UserInfo::from(&created))
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<UserInfo, DomainError> {
        policy::require(actor, Resource::User, Action::View)?;
        let user = self.load(id).await?;
        Ok(UserInfo::from(&user))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &UserFilter,
        page: Pagination,
    ) -> Result<Page<UserInfo>, DomainError> {
        policy::require(actor, Resource::User, Action::View)?;
        let users = self.user_repo.list(filter, page).await?;
        Ok(users.map(|u| UserInfo::from(&u)))
    }

    pub async fn update_role(&self, actor: &Actor, id: Uuid, role: UserRole) -> Result<UserInfo, DomainError> {
        policy::require_role(actor, &[UserRole::Admin], "change user roles")?;
        if actor.user_id == id {
            return Err(DomainError::forbidden("Cannot change your own role"));
        }

        let mut user = self.load(id).await?;
        let previous = user.role;
        if previous == role {
            return Ok(UserInfo::from(&user));
        }
        user.role = role;
        user.updated_at = chrono::Utc::now();
        let updated = self.user_repo.update(&user).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::UserRoleChanged, EntityKind::User)
                .entity_id(id)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .json(json!({ "from": previous.as_str(), "to": role.as_str() }))
                .build(),
        );
        warn!("User {} role changed from {} to {} by {}", id, previous, role, actor.user_id);

        Ok(UserInfo::from(&updated))
    }

    /// Moves several users to one role. The caller may not be in the batch.
    pub async fn bulk_update_roles(&self, actor: &Actor, ids: &[Uuid], role: UserRole) -> Result<u64, DomainError> {
        policy::require_role(actor, &[UserRole::Admin], "change user roles")?;
        if ids.is_empty() {
            return Err(DomainError::validation(vec!["At least one user id is required".into()]));
        }
        if ids.contains(&actor.user_id) {
            return Err(DomainError::forbidden("Cannot change your own role"));
        }

        let updated = self.user_repo.update_roles(ids, role).await?;
        self.activity.record(
            ActivityLog::builder(ActivityAction::UserRoleChanged, EntityKind::User)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .json(json!({ "user_ids": ids, "to": role.as_str(), "updated": updated }))
                .build(),
        );
        warn!("{} users moved to role {} by {}", updated, role, actor.user_id);
        Ok(updated)
    }

    pub async fn set_active(&self, actor: &Actor, id: Uuid, is_active: bool) -> Result<UserInfo, DomainError> {
        policy::require(actor, Resource::User, Action::Update)?;
        if actor.user_id == id && !is_active {
            return Err(DomainError::forbidden("Cannot deactivate your own account"));
        }

        let mut user = self.load(id).await?;
        if user.is_active == is_active {
            return Ok(UserInfo::from(&user));
        }
        user.is_active = is_active;
        user.updated_at = chrono::Utc::now();
        let updated = self.user_repo.update(&user).await?;

        let (action, severity) = if is_active {
            (ActivityAction::UserActivated, Severity::Info)
        } else {
            (ActivityAction::UserDeactivated, Severity::Warning)
        };
        self.activity.record(
            ActivityLog::builder(action, EntityKind::User)
                .entity_id(id)
                .user(actor.user_id)
                .severity(severity)
                .build(),
        );
        info!("User {} active={} set by {}", id, is_active, actor.user_id);

        Ok(UserInfo::from(&updated))
    }

    pub async fn role_statistics(&self, actor: &Actor) -> Result<RoleStatistics, DomainError> {
        policy::require_role(actor, &[UserRole::Admin], "view user statistics")?;
        let users = self.user_repo.find_all().await?;

        let mut by_role: BTreeMap<String, usize> =
            UserRole::ALL.iter().map(|r| (r.as_str().to_string(), 0)).collect();
        for user in &users {
            *by_role.entry(user.role.as_str().to_string()).or_default() += 1;
        }
        let active = users.iter().filter(|u| u.is_active).count();

        Ok(RoleStatistics {
            total: users.len(),
            active,
            inactive: users.len() - active,
            by_role,
        })
    }

    /// Creates the first administrator at startup. `None` when the email is
    /// blank or already registered.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<Option<UserInfo>, DomainError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        if self.user_repo.find_by_email(&email).await?.is_some() {
            info!("Bootstrap admin {} already present", bizhub_shared::utils::mask_email(&email));
            return Ok(None);
        }

        PasswordService::check_strength(password, &[name, email.as_str()])?;
        let password_hash = PasswordService::hash(password)?;
        let user = User::new(name.to_string(), email, password_hash, UserRole::Admin)?;
        let created = self.user_repo.create(&user).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::UserCreated, EntityKind::User)
                .entity_id(created.id)
                .severity(Severity::Warning)
                .json(json!({ "role": created.role.as_str(), "bootstrap": true }))
                .build(),
        );
        warn!("Bootstrap admin created: {}", created.id);

        Ok(Some(UserInfo::from(&created)))
    }

    async fn load(&self, id: Uuid) -> Result<User, DomainError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockUserRepository;
    use crate::services::test_support::{actor, expect_activity, no_activity};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn stored(role: UserRole) -> User {
        let email: String = SafeEmail().fake();
        User::new("Stored User".into(), email, "hash".into(), role).unwrap()
    }

    fn input(password: &str) -> CreateUserInput {
        CreateUserInput {
            name: "Nadia Petrovic".into(),
            email: "Nadia@BizHub.example".into(),
            password: password.into(),
            role: UserRole::Agent,
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .withf(|e| e == "nadia@bizhub.example")
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|u| u.password_hash.starts_with("$argon2") && u.role == UserRole::Agent)
            .returning(|u| Ok(u.clone()));

        let service = UserService::new(Arc::new(repo), Arc::new(expect_activity("USER_CREATED")));
        let info = service
            .create(&actor(UserRole::Admin), input("Orchard-Lantern-57-Quiet"))
            .await
            .unwrap();
        assert_eq!(info.email, "nadia@bizhub.example");
    }

    #[tokio::test]
    async fn test_create_user_rejects_weak_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create().never();

        let service = UserService::new(Arc::new(repo), Arc::new(no_activity()));
        let err = service.create(&actor(UserRole::Admin), input("password")).await.unwrap_err();
        assert!(matches!(err, DomainError::PasswordTooWeak));

        let err = service.create(&actor(UserRole::Admin), input("short")).await.unwrap_err();
        assert!(matches!(err, DomainError::PasswordTooShort));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(Some(stored(UserRole::User))));

        let service = UserService::new(Arc::new(repo), Arc::new(no_activity()));
        let err = service
            .create(&actor(UserRole::Admin), input("Orchard-Lantern-57-Quiet"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_manager_cannot_create_users() {
        let service = UserService::new(Arc::new(MockUserRepository::new()), Arc::new(no_activity()));
        let err = service
            .create(&actor(UserRole::Manager), input("Orchard-Lantern-57-Quiet"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_role_records_warning() {
        let target = stored(UserRole::User);
        let target_id = target.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(target.clone())));
        repo.expect_update().returning(|u| Ok(u.clone()));

        let mut recorder = crate::repositories::MockActivityRecorder::new();
        recorder
            .expect_record()
            .withf(|e| e.action == "USER_ROLE_CHANGED" && e.severity == Severity::Warning)
            .times(1)
            .return_const(());

        let service = UserService::new(Arc::new(repo), Arc::new(recorder));
        let info = service
            .update_role(&actor(UserRole::Admin), target_id, UserRole::Manager)
            .await
            .unwrap();
        assert_eq!(info.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_cannot_change_own_role_or_deactivate_self() {
        let admin = actor(UserRole::Admin);
        let service = UserService::new(Arc::new(MockUserRepository::new()), Arc::new(no_activity()));

        assert!(matches!(
            service.update_role(&admin, admin.user_id, UserRole::User).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.set_active(&admin, admin.user_id, false).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.bulk_update_roles(&admin, &[Uuid::new_v4(), admin.user_id], UserRole::User).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivate_user() {
        let target = stored(UserRole::Agent);
        let target_id = target.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(target.clone())));
        repo.expect_update().withf(|u| !u.is_active).returning(|u| Ok(u.clone()));

        let service = UserService::new(Arc::new(repo), Arc::new(expect_activity("USER_DEACTIVATED")));
        let info = service.set_active(&actor(UserRole::Admin), target_id, false).await.unwrap();
        assert!(!info.is_active);
    }

    #[tokio::test]
    async fn test_role_statistics_zero_fills_roles() {
        let mut inactive = stored(UserRole::Agent);
        inactive.is_active = false;
        let users = vec![stored(UserRole::Admin), stored(UserRole::Agent), inactive];
        let mut repo = MockUserRepository::new();
        repo.expect_find_all().returning(move || Ok(users.clone()));

        let service = UserService::new(Arc::new(repo), Arc::new(no_activity()));
        let stats = service.role_statistics(&actor(UserRole::Admin)).await.unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.by_role["AGENT"], 2);
        assert_eq!(stats.by_role["MANAGER"], 0);
    }

    #[tokio::test]
    async fn test_ensure_admin_creates_once() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create()
            .withf(|u| u.role == UserRole::Admin && u.email == "root@bizhub.example")
            .returning(|u| Ok(u.clone()));

        let service = UserService::new(Arc::new(repo), Arc::new(expect_activity("USER_CREATED")));
        let created = service
            .ensure_admin("Root", " Root@BizHub.example ", "Orchard-Lantern-57-Quiet")
            .await
            .unwrap();
        assert_eq!(created.map(|u| u.role), Some(UserRole::Admin));
    }

    #[tokio::test]
    async fn test_ensure_admin_skips_existing_or_blank_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(stored(UserRole::Admin))));
        repo.expect_create().never();

        let service = UserService::new(Arc::new(repo), Arc::new(no_activity()));
        assert!(service.ensure_admin("Root", "", "irrelevant").await.unwrap().is_none());
        assert!(service
            .ensure_admin("Root", "root@bizhub.example", "Orchard-Lantern-57-Quiet")
            .await
            .unwrap()
            .is_none());
    }
}
