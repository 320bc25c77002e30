//! Humanitarian renewal repository trait (port)

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{HumanitarianRenewal, HumanitarianRenewalDetails, HumanitarianRenewalFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait HumanitarianRenewalRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HumanitarianRenewalDetails>, DomainError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<HumanitarianRenewalDetails>, DomainError>;
    /// The renewal of `contract_id` not yet in final processing, if any.
    async fn find_open_for_contract(&self, contract_id: Uuid) -> Result<Option<HumanitarianRenewal>, DomainError>;
    async fn list(
        &self,
        filter: &HumanitarianRenewalFilter,
        page: Pagination,
    ) -> Result<Page<HumanitarianRenewalDetails>, DomainError>;
    async fn find_all(&self) -> Result<Vec<HumanitarianRenewal>, DomainError>;
    async fn create(&self, renewal: &HumanitarianRenewal) -> Result<HumanitarianRenewal, DomainError>;
    async fn update(&self, renewal: &HumanitarianRenewal) -> Result<HumanitarianRenewal, DomainError>;
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, DomainError>;
}
