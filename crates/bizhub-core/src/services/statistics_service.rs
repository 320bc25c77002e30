// ============================================================================
// BizHub Core - Statistics Service
// File: crates/bizhub-core/src/services/statistics_service.rs
// ============================================================================
//! Dashboard aggregates. Rows are fetched through the repositories and
//! folded by the pure functions in `crate::statistics`.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{Actor, ComplaintFilter};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ComplaintRepository, ContractRepository};
use crate::statistics::{complaint_stats, contract_stats, ComplaintStats, ContractStats};

pub struct StatisticsService {
    complaint_repo: Arc<dyn ComplaintRepository>,
    contract_repo: Arc<dyn ContractRepository>,
}

impl StatisticsService {
    pub fn new(complaint_repo: Arc<dyn ComplaintRepository>, contract_repo: Arc<dyn ContractRepository>) -> Self {
        Self {
            complaint_repo,
            contract_repo,
        }
    }

    /// Complaint aggregates over the complaints matching `filter`,
    /// typically a creation date range.
    pub async fn complaint_stats(&self, actor: &Actor, filter: &ComplaintFilter) -> Result<ComplaintStats, DomainError> {
        policy::require(actor, Resource::Analytics, Action::View)?;
        let complaints = self.complaint_repo.find_matching(filter).await?;
        Ok(complaint_stats(&complaints))
    }

    pub async fn contract_stats(
        &self,
        actor: &Actor,
        today: NaiveDate,
        expiring_days: i64,
    ) -> Result<ContractStats, DomainError> {
        policy::require(actor, Resource::Analytics, Action::View)?;
        let contracts = self.contract_repo.find_all().await?;
        Ok(contract_stats(&contracts, today, expiring_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complaint::fixtures::complaint_with_status;
    use crate::domain::contract::fixtures::{contract_with_status, date};
    use crate::domain::{ComplaintStatus, ContractStatus, UserRole};
    use crate::repositories::{MockComplaintRepository, MockContractRepository};
    use crate::services::test_support::actor;

    #[tokio::test]
    async fn test_complaint_stats() {
        let rows = vec![
            complaint_with_status(ComplaintStatus::New),
            complaint_with_status(ComplaintStatus::Resolved),
        ];
        let mut complaints = MockComplaintRepository::new();
        complaints.expect_find_matching().returning(move |_| Ok(rows.clone()));

        let service = StatisticsService::new(Arc::new(complaints), Arc::new(MockContractRepository::new()));
        let stats = service
            .complaint_stats(&actor(UserRole::Manager), &ComplaintFilter::default())
            .await
            .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.resolution_rate, 50.0);
    }

    #[tokio::test]
    async fn test_contract_stats_counts_expiring() {
        let rows = vec![
            contract_with_status(ContractStatus::Active),
            contract_with_status(ContractStatus::Draft),
        ];
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_all().returning(move || Ok(rows.clone()));

        let service = StatisticsService::new(Arc::new(MockComplaintRepository::new()), Arc::new(contracts));
        let stats = service
            .contract_stats(&actor(UserRole::Admin), date(2024, 12, 15), 30)
            .await
            .unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.expiring_soon, 1);
    }

    #[tokio::test]
    async fn test_agents_have_no_analytics() {
        let service = StatisticsService::new(
            Arc::new(MockComplaintRepository::new()),
            Arc::new(MockContractRepository::new()),
        );
        assert!(matches!(
            service.contract_stats(&actor(UserRole::Agent), date(2024, 1, 1), 30).await,
            Err(DomainError::Forbidden(_))
        ));
    }
}
