//! PostgreSQL repository implementations

mod directory_filter;

pub mod user_repo_impl;
pub mod contract_repo_impl;
pub mod renewal_repo_impl;
pub mod humanitarian_renewal_repo_impl;
pub mod complaint_repo_impl;
pub mod provider_repo_impl;
pub mod humanitarian_org_repo_impl;
pub mod parking_service_repo_impl;
pub mod service_offering_repo_impl;
pub mod activity_log_repo_impl;

pub use user_repo_impl::PgUserRepository;
pub use contract_repo_impl::PgContractRepository;
pub use renewal_repo_impl::PgRenewalRepository;
pub use humanitarian_renewal_repo_impl::PgHumanitarianRenewalRepository;
pub use complaint_repo_impl::PgComplaintRepository;
pub use provider_repo_impl::PgProviderRepository;
pub use humanitarian_org_repo_impl::PgHumanitarianOrgRepository;
pub use parking_service_repo_impl::PgParkingServiceRepository;
pub use service_offering_repo_impl::PgServiceOfferingRepository;
pub use activity_log_repo_impl::PgActivityLogRepository;
