//! Directory repository traits (ports): providers, humanitarian organizations,
//! parking services and the service catalog.

use async_trait::async_trait;
use bizhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{DirectoryFilter, HumanitarianOrg, ParkingService, Provider, ServiceOffering};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>, DomainError>;
    /// Case-insensitive
    async fn find_by_name(&self, name: &str) -> Result<Option<Provider>, DomainError>;
    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<Provider>, DomainError>;
    async fn create(&self, provider: &Provider) -> Result<Provider, DomainError>;
    async fn update(&self, provider: &Provider) -> Result<Provider, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait HumanitarianOrgRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HumanitarianOrg>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<HumanitarianOrg>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<HumanitarianOrg>, DomainError>;
    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<HumanitarianOrg>, DomainError>;
    async fn create(&self, org: &HumanitarianOrg) -> Result<HumanitarianOrg, DomainError>;
    async fn update(&self, org: &HumanitarianOrg) -> Result<HumanitarianOrg, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ParkingServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ParkingService>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<ParkingService>, DomainError>;
    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<ParkingService>, DomainError>;
    async fn create(&self, service: &ParkingService) -> Result<ParkingService, DomainError>;
    async fn update(&self, service: &ParkingService) -> Result<ParkingService, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ServiceOfferingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOffering>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<ServiceOffering>, DomainError>;
    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<ServiceOffering>, DomainError>;
    async fn create(&self, service: &ServiceOffering) -> Result<ServiceOffering, DomainError>;
    async fn update(&self, service: &ServiceOffering) -> Result<ServiceOffering, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}
