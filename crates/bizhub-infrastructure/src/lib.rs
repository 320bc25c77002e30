//! # BizHub Infrastructure
//!
//! PostgreSQL adapters for the core repository ports, schema migrations
//! and the batched activity-log writer.

pub mod database;
pub mod logging;

pub use database::{
    create_pool, run_migrations, PgActivityLogRepository, PgComplaintRepository, PgContractRepository,
    PgHumanitarianOrgRepository, PgHumanitarianRenewalRepository, PgParkingServiceRepository, PgProviderRepository,
    PgRenewalRepository, PgServiceOfferingRepository, PgUserRepository,
};
pub use logging::{ActivityLogWorkers, ActivityLogger, LoggerConfig};
