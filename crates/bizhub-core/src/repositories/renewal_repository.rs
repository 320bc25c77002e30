//! Contract renewal repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ContractRenewal, RenewalSubStatus};
use crate::error::DomainError;

/// Renewals are opened and closed through `ContractRepository::apply_status_change`;
/// this port covers reads and stage updates.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RenewalRepository: Send + Sync {
    async fn find_active(&self, contract_id: Uuid) -> Result<Option<ContractRenewal>, DomainError>;
    async fn find_by_contract(&self, contract_id: Uuid) -> Result<Vec<ContractRenewal>, DomainError>;
    /// Writes the renewal only while the stored row is active and still in
    /// `expected`; otherwise `Conflict` (or `NotFound` for an unknown id).
    async fn update(&self, renewal: &ContractRenewal, expected: RenewalSubStatus)
        -> Result<ContractRenewal, DomainError>;
}
