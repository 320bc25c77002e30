//! # BizHub Core - Domain Module
//!
//! Domain entities, status state machines and their input types.

pub mod role;
pub mod user;
pub mod contract;
pub mod contract_status;
pub mod status_change;
pub mod renewal;
pub mod humanitarian_renewal;
pub mod complaint;
pub mod directory;
pub mod provider;
pub mod humanitarian_org;
pub mod parking_service;
pub mod service_offering;
pub mod activity;

// Re-export all entities and enums
pub use role::{Actor, UserRole};
pub use user::{User, UserFilter};
pub use contract::{
    days_until_expiration, expiration_status, Contract, ContractFilter, ContractInput, ContractServiceTerm,
    ContractStatusLog, ContractType, ExpirationStatus,
};
pub use contract_status::ContractStatus;
pub use status_change::{ContractStatusChange, RenewalCompletion, RenewalEffect, StatusChangeRequest};
pub use renewal::{ContractRenewal, RenewalChecklist, RenewalSubStatus};
pub use humanitarian_renewal::{
    CreateHumanitarianRenewalInput, HumanitarianRenewal, HumanitarianRenewalDetails, HumanitarianRenewalFilter,
    HumanitarianRenewalStatus, UpdateHumanitarianRenewalInput,
};
pub use complaint::{
    Complaint, ComplaintComment, ComplaintFilter, ComplaintInput, ComplaintStatus, ComplaintStatusHistory,
};
pub use directory::DirectoryFilter;
pub use provider::{Provider, ProviderInput};
pub use humanitarian_org::{HumanitarianOrg, HumanitarianOrgInput};
pub use parking_service::{ParkingService, ParkingServiceInput};
pub use service_offering::{ServiceOffering, ServiceOfferingInput, ServiceType};
pub use activity::{ActivityAction, ActivityFilter, ActivityLog, ActivityLogBuilder, EntityKind, Severity};
