//! Contract repository trait (port)

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Contract, ContractFilter, ContractStatusChange, ContractStatusLog};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, DomainError>;
    async fn find_by_number(&self, contract_number: &str) -> Result<Option<Contract>, DomainError>;
    async fn list(&self, filter: &ContractFilter, page: Pagination) -> Result<Page<Contract>, DomainError>;
    async fn find_all(&self) -> Result<Vec<Contract>, DomainError>;
    /// ACTIVE contracts with `from <= end_date <= to`, soonest first.
    async fn find_expiring(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Contract>, DomainError>;
    /// ACTIVE contracts with `end_date < today`.
    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Contract>, DomainError>;
    async fn create(&self, contract: &Contract) -> Result<Contract, DomainError>;
    async fn update(&self, contract: &Contract) -> Result<Contract, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    /// Persists the contract, the status log row and the renewal effect atomically.
    async fn apply_status_change(&self, change: &ContractStatusChange) -> Result<Contract, DomainError>;
    async fn status_history(&self, contract_id: Uuid) -> Result<Vec<ContractStatusLog>, DomainError>;
}
