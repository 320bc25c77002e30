//! User repository trait (port)

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{User, UserFilter, UserRole};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn list(&self, filter: &UserFilter, page: Pagination) -> Result<Page<User>, DomainError>;
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    /// Sets `role` on every listed user, returns the number of rows changed.
    async fn update_roles(&self, ids: &[Uuid], role: UserRole) -> Result<u64, DomainError>;
}
