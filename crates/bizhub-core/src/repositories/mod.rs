//! Repository traits (ports) implemented by the infrastructure layer.

pub mod user_repository;
pub mod contract_repository;
pub mod renewal_repository;
pub mod humanitarian_renewal_repository;
pub mod complaint_repository;
pub mod directory_repository;
pub mod activity_repository;

pub use user_repository::UserRepository;
pub use contract_repository::ContractRepository;
pub use renewal_repository::RenewalRepository;
pub use humanitarian_renewal_repository::HumanitarianRenewalRepository;
pub use complaint_repository::ComplaintRepository;
pub use directory_repository::{
    HumanitarianOrgRepository, ParkingServiceRepository, ProviderRepository, ServiceOfferingRepository,
};
pub use activity_repository::{ActivityLogRepository, ActivityRecorder};

#[cfg(any(test, feature = "mocks"))]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "mocks"))]
pub use contract_repository::MockContractRepository;
#[cfg(any(test, feature = "mocks"))]
pub use renewal_repository::MockRenewalRepository;
#[cfg(any(test, feature = "mocks"))]
pub use humanitarian_renewal_repository::MockHumanitarianRenewalRepository;
#[cfg(any(test, feature = "mocks"))]
pub use complaint_repository::MockComplaintRepository;
#[cfg(any(test, feature = "mocks"))]
pub use directory_repository::{
    MockHumanitarianOrgRepository, MockParkingServiceRepository, MockProviderRepository,
    MockServiceOfferingRepository,
};
#[cfg(any(test, feature = "mocks"))]
pub use activity_repository::{MockActivityLogRepository, MockActivityRecorder};
