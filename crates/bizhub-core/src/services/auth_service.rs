// ============================================================================
// BizHub Core - Authentication Service
// File: crates/bizhub-core/src/services/auth_service.rs
// ============================================================================
//! Login and access-token handling

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bizhub_security::{JwtError, JwtService, LoginRateLimiter, PasswordService};
use bizhub_shared::utils::{mask_email, normalize_email};

use crate::domain::{ActivityAction, ActivityLog, Actor, EntityKind, Severity, User, UserRole};
use crate::error::DomainError;
use crate::policy;
use crate::repositories::{ActivityRecorder, UserRepository};

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    activity: Arc<dyn ActivityRecorder>,
    jwt: JwtService,
    limiter: Arc<LoginRateLimiter>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        activity: Arc<dyn ActivityRecorder>,
        jwt: JwtService,
        limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self {
            user_repo,
            activity,
            jwt,
            limiter,
        }
    }

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        let email = normalize_email(email);
        info!("Login attempt for email: {}", mask_email(&email));

        // 1. Throttle repeated attempts per email
        if !self.limiter.check(&email) {
            warn!("Login throttled for: {}", mask_email(&email));
            return Err(DomainError::TooManyAttempts);
        }

        // 2. Find user by email
        let user = match self.user_repo.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("Login failed: email not found: {}", mask_email(&email));
                self.record_failure(None, &email, "unknown email");
                return Err(DomainError::InvalidCredentials);
            }
        };

        // 3. Verify password
        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !password_valid {
            warn!("Login failed: invalid password for: {}", mask_email(&email));
            self.record_failure(Some(user.id), &email, "invalid password");
            return Err(DomainError::InvalidCredentials);
        }

        // 4. Check if user can login
        if !user.can_login() {
            warn!("Login failed: user {} is deactivated", user.id);
            self.record_failure(Some(user.id), &email, "account deactivated");
            return Err(DomainError::UserNotActive);
        }

        // 5. Issue access token
        let access_token = self
            .jwt
            .generate_access_token(&user.id, user.role.as_str())
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        // 6. Update last login
        let mut updated_user = user.clone();
        updated_user.record_login();
        if let Err(e) = self.user_repo.update(&updated_user).await {
            error!("Failed to update last login: {}", e);
        }

        self.activity.record(
            ActivityLog::builder(ActivityAction::Login, EntityKind::User)
                .entity_id(user.id)
                .user(user.id)
                .build(),
        );
        info!("Login successful for: {}", mask_email(&email));

        Ok(LoginResult {
            user: UserInfo::from(&updated_user),
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry(),
        })
    }

    /// Resolves a bearer token into the acting user. The account is reloaded
    /// on every call, so deactivation and role changes apply to live tokens.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, DomainError> {
        let claims = self.jwt.validate_token(token).map_err(|e| match e {
            JwtError::TokenExpired => DomainError::Unauthorized("Token expired".into()),
            other => DomainError::Unauthorized(other.to_string()),
        })?;
        let user_id = claims
            .user_id()
            .map_err(|e| DomainError::Unauthorized(e.to_string()))?;
        UserRole::from_str(&claims.role)
            .ok_or_else(|| DomainError::Unauthorized(format!("Unknown role in token: {}", claims.role)))?;

        let user = match self.user_repo.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                warn!("Token presented for unknown user {}", user_id);
                return Err(DomainError::Unauthorized("Account no longer exists".into()));
            }
        };
        if !user.can_login() {
            warn!("Token presented for deactivated user {}", user_id);
            return Err(DomainError::Unauthorized("Account is deactivated".into()));
        }
        if user.role.as_str() != claims.role {
            debug!("Role of user {} changed since token issue: {} -> {}", user_id, claims.role, user.role);
        }
        Ok(Actor::new(user.id, user.role))
    }

    pub async fn current_user(&self, actor: &Actor) -> Result<UserInfo, DomainError> {
        let user = self
            .user_repo
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", actor.user_id))?;
        if !user.can_login() {
            return Err(DomainError::UserNotActive);
        }
        Ok(UserInfo::from(&user))
    }

    fn record_failure(&self, user_id: Option<Uuid>, email: &str, reason: &str) {
        let mut builder = ActivityLog::builder(ActivityAction::LoginFailed, EntityKind::User)
            .severity(Severity::Warning)
            .json(json!({ "email": mask_email(email), "reason": reason }));
        if let Some(id) = user_id {
            builder = builder.entity_id(id).user(id);
        }
        self.activity.record(builder.build());
    }
}

/// Result of successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserInfo,
    pub access_token: String,
    pub token_type: String,
    /// Seconds
    pub expires_in: i64,
}

/// User info returned in auth and user responses
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub permissions: Vec<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            permissions: policy::granted(user.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockActivityRecorder, MockUserRepository};
    use crate::services::test_support::expect_activity;

    const PASSWORD: &str = "Meadow-Kiosk-Travel-91";

    fn user(active: bool) -> User {
        let hash = PasswordService::hash(PASSWORD).unwrap();
        let mut user = User::new("Mila Agent".into(), "mila@bizhub.example".into(), hash, UserRole::Agent).unwrap();
        user.is_active = active;
        user
    }

    fn service(repo: MockUserRepository, recorder: MockActivityRecorder) -> AuthService {
        AuthService::new(
            Arc::new(repo),
            Arc::new(recorder),
            JwtService::new("unit-test-secret".into(), 3600),
            Arc::new(LoginRateLimiter::new(100)),
        )
    }

    #[tokio::test]
    async fn test_login_success_issues_token_with_role() {
        let stored = user(true);
        let stored_id = stored.id;
        let mut repo = MockUserRepository::new();
        let found = stored.clone();
        repo.expect_find_by_email()
            .withf(|email| email == "mila@bizhub.example")
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update().times(1).returning(|u| Ok(u.clone()));
        repo.expect_find_by_id()
            .withf(move |id| *id == stored_id)
            .returning(move |_| Ok(Some(found.clone())));

        let service = service(repo, expect_activity("LOGIN"));
        let result = service.login(" MILA@bizhub.example ", PASSWORD).await.unwrap();

        assert_eq!(result.user.id, stored_id);
        assert!(result.user.last_login_at.is_some());
        let actor = service.authenticate(&result.access_token).await.unwrap();
        assert_eq!(actor, Actor::new(stored_id, UserRole::Agent));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let stored = user(true);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update().never();

        let service = service(repo, expect_activity("LOGIN_FAILED"));
        let err = service.login("mila@bizhub.example", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let service = service(repo, expect_activity("LOGIN_FAILED"));
        let err = service.login("ghost@bizhub.example", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_inactive_user() {
        let stored = user(false);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(move |_| Ok(Some(stored.clone())));

        let service = service(repo, expect_activity("LOGIN_FAILED"));
        let err = service.login("mila@bizhub.example", PASSWORD).await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotActive));
    }

    #[tokio::test]
    async fn test_login_throttled() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().times(1).returning(|_| Ok(None));

        let service = AuthService::new(
            Arc::new(repo),
            Arc::new(expect_activity("LOGIN_FAILED")),
            JwtService::new("unit-test-secret".into(), 3600),
            Arc::new(LoginRateLimiter::new(1)),
        );
        assert!(service.login("a@bizhub.example", "x").await.is_err());
        let err = service.login("a@bizhub.example", "x").await.unwrap_err();
        assert!(matches!(err, DomainError::TooManyAttempts));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().never();
        let service = service(repo, MockActivityRecorder::new());
        assert!(matches!(service.authenticate("garbage").await, Err(DomainError::Unauthorized(_))));
    }

    fn token_for(stored: &User) -> String {
        JwtService::new("unit-test-secret".into(), 3600)
            .generate_access_token(&stored.id, stored.role.as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deactivated_account() {
        let stored = user(false);
        let token = token_for(&stored);
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).returning(move |_| Ok(Some(stored.clone())));

        let service = service(repo, MockActivityRecorder::new());
        let err = service.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deleted_account() {
        let token = token_for(&user(true));
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service(repo, MockActivityRecorder::new());
        let err = service.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authenticate_uses_current_role() {
        let mut stored = user(true);
        let token = token_for(&stored);
        stored.role = UserRole::Manager;
        let stored_id = stored.id;
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(stored.clone())));

        let service = service(repo, MockActivityRecorder::new());
        let actor = service.authenticate(&token).await.unwrap();
        assert_eq!(actor, Actor::new(stored_id, UserRole::Manager));
    }
}
