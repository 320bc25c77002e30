//! Application services. Each operation checks permissions, validates,
//! persists through the repository ports and records an activity entry.

pub mod auth_service;
pub mod user_service;
pub mod contract_service;
pub mod renewal_service;
pub mod humanitarian_renewal_service;
pub mod complaint_service;
pub mod directory_service;
pub mod activity_service;
pub mod statistics_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_service::{AuthService, LoginResult, UserInfo};
pub use user_service::{CreateUserInput, RoleStatistics, UserService};
pub use contract_service::{ContractService, ExpiringContract};
pub use renewal_service::{RenewalService, StartRenewalInput};
pub use humanitarian_renewal_service::HumanitarianRenewalService;
pub use complaint_service::{ChangeComplaintStatus, ComplaintService};
pub use directory_service::{CatalogService, HumanitarianOrgService, ParkingDirectoryService, ProviderService};
pub use activity_service::ActivityService;
pub use statistics_service::StatisticsService;
