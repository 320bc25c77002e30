use std::sync::Arc;

use bizhub_core::services::{
    ActivityService, AuthService, CatalogService, ComplaintService, ContractService, HumanitarianOrgService,
    HumanitarianRenewalService, ParkingDirectoryService, ProviderService, RenewalService, StatisticsService,
    UserService,
};
use sqlx::PgPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub contracts: Arc<ContractService>,
    pub renewals: Arc<RenewalService>,
    pub humanitarian_renewals: Arc<HumanitarianRenewalService>,
    pub complaints: Arc<ComplaintService>,
    pub providers: Arc<ProviderService>,
    pub humanitarian_orgs: Arc<HumanitarianOrgService>,
    pub parking_services: Arc<ParkingDirectoryService>,
    pub catalog: Arc<CatalogService>,
    pub activity: Arc<ActivityService>,
    pub statistics: Arc<StatisticsService>,
    /// Default window for `/contracts/expiring` and contract analytics
    pub expiring_soon_days: i64,
}
