// ============================================================================
// BizHub Core - Contract Service
// File: crates/bizhub-core/src/services/contract_service.rs
// ============================================================================
//! Contract CRUD, status transitions and expiry handling

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use bizhub_shared::{Page, Pagination};

use crate::domain::{
    ActivityAction, ActivityLog, Actor, Contract, ContractFilter, ContractInput, ContractStatus,
    ContractStatusChange, ContractStatusLog, EntityKind, Severity, StatusChangeRequest,
};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ActivityRecorder, ContractRepository, RenewalRepository};

/// An ACTIVE contract close to its end date
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringContract {
    #[serde(flatten)]
    pub contract: Contract,
    pub days_until_expiration: i64,
}

pub struct ContractService {
    contract_repo: Arc<dyn ContractRepository>,
    renewal_repo: Arc<dyn RenewalRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl ContractService {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        renewal_repo: Arc<dyn RenewalRepository>,
        activity: Arc<dyn ActivityRecorder>,
    ) -> Self {
        Self {
            contract_repo,
            renewal_repo,
            activity,
        }
    }

    pub async fn create(&self, actor: &Actor, input: ContractInput) -> Result<Contract, DomainError> {
        policy::require(actor, Resource::Contract, Action::Create)?;

        // 1. Validate and build
        let contract = Contract::new(input, actor.user_id)?;

        // 2. Contract numbers are unique
        if self.contract_repo.find_by_number(&contract.contract_number).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Contract number {} already exists",
                contract.contract_number
            )));
        }

        // 3. Persist
        let created = self.contract_repo.create(&contract).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ContractCreated, EntityKind::Contract)
                .entity_id(created.id)
                .user(actor.user_id)
                .json(json!({
                    "contract_number": created.contract_number,
                    "status": created.status.as_str(),
                }))
                .build(),
        );
        info!("Contract created: {} ({})", created.contract_number, created.id);

        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: ContractInput) -> Result<Contract, DomainError> {
        policy::require(actor, Resource::Contract, Action::Update)?;

        let mut contract = self.load(id).await?;
        contract.apply_update(input, actor.user_id)?;

        if let Some(existing) = self.contract_repo.find_by_number(&contract.contract_number).await? {
            if existing.id != id {
                return Err(DomainError::Conflict(format!(
                    "Contract number {} already exists",
                    contract.contract_number
                )));
            }
        }

        let updated = self.contract_repo.update(&contract).await?;
        self.activity.record(
            ActivityLog::builder(ActivityAction::ContractUpdated, EntityKind::Contract)
                .entity_id(id)
                .user(actor.user_id)
                .details(format!("Contract {} updated", updated.contract_number))
                .build(),
        );
        info!("Contract updated: {}", id);

        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Contract, Action::Delete)?;

        let contract = self.load(id).await?;
        self.contract_repo.delete(id).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ContractDeleted, EntityKind::Contract)
                .entity_id(id)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .details(format!("Contract {} deleted", contract.contract_number))
                .build(),
        );
        warn!("Contract {} deleted by {}", contract.contract_number, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Contract, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &ContractFilter,
        page: Pagination,
    ) -> Result<Page<Contract>, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        self.contract_repo.list(filter, page).await
    }

    /// Moves a contract through the state machine. Status, log row and any
    /// renewal opened or closed by the move are persisted together.
    pub async fn change_status(
        &self,
        actor: &Actor,
        id: Uuid,
        new_status: ContractStatus,
        comments: Option<String>,
    ) -> Result<Contract, DomainError> {
        policy::require(actor, Resource::Contract, Action::Update)?;

        let contract = self.load(id).await?;
        let old_status = contract.status;
        let request = StatusChangeRequest::new(new_status, comments.clone(), Some(actor.user_id));
        let updated = self.apply(&contract, request, Utc::now()).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ContractStatusChanged, EntityKind::Contract)
                .entity_id(id)
                .user(actor.user_id)
                .json(json!({
                    "from": old_status.as_str(),
                    "to": new_status.as_str(),
                    "comments": comments,
                }))
                .build(),
        );
        info!("Contract {} status {} -> {}", contract.contract_number, old_status, new_status);

        Ok(updated)
    }

    pub async fn status_history(&self, actor: &Actor, id: Uuid) -> Result<Vec<ContractStatusLog>, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        self.load(id).await?;
        self.contract_repo.status_history(id).await
    }

    /// ACTIVE contracts ending within `[today, today + days]`, soonest first.
    pub async fn expiring(
        &self,
        actor: &Actor,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<ExpiringContract>, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        if days < 0 {
            return Err(DomainError::validation(vec!["Days must not be negative".into()]));
        }

        let mut contracts = self.contract_repo.find_expiring(today, today + Duration::days(days)).await?;
        contracts.sort_by_key(|c| c.end_date);
        Ok(contracts
            .into_iter()
            .filter(|c| c.status == ContractStatus::Active)
            .map(|contract| ExpiringContract {
                days_until_expiration: contract.days_until_expiration(today),
                contract,
            })
            .collect())
    }

    /// System sweep: ACTIVE contracts past their end date become EXPIRED.
    /// A failure on one contract is logged and does not stop the sweep.
    pub async fn expire_overdue(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let overdue = self.contract_repo.find_overdue(today).await?;
        let mut expired = 0;

        for contract in overdue.iter().filter(|c| c.status == ContractStatus::Active) {
            let request = StatusChangeRequest::new(
                ContractStatus::Expired,
                Some("Contract end date passed".to_string()),
                None,
            );
            match self.apply(contract, request, now).await {
                Ok(_) => {
                    expired += 1;
                    self.activity.record(
                        ActivityLog::builder(ActivityAction::ContractExpired, EntityKind::Contract)
                            .entity_id(contract.id)
                            .severity(Severity::Warning)
                            .json(json!({
                                "contract_number": contract.contract_number,
                                "end_date": contract.end_date,
                            }))
                            .build(),
                    );
                    warn!("Contract {} expired on {}", contract.contract_number, contract.end_date);
                }
                Err(e) => error!("Failed to expire contract {}: {}", contract.id, e),
            }
        }

        if expired > 0 {
            info!("Expiry sweep moved {} contracts to EXPIRED", expired);
        }
        Ok(expired)
    }

    async fn apply(
        &self,
        contract: &Contract,
        request: StatusChangeRequest,
        now: DateTime<Utc>,
    ) -> Result<Contract, DomainError> {
        // only moves into or out of RENEWAL_IN_PROGRESS touch the renewal
        let touches_renewal = contract.status == ContractStatus::RenewalInProgress
            || request.new_status == ContractStatus::RenewalInProgress;
        let active_renewal = if touches_renewal {
            self.renewal_repo.find_active(contract.id).await?
        } else {
            None
        };

        let change = ContractStatusChange::plan(contract, active_renewal, request, now)?;
        self.contract_repo.apply_status_change(&change).await
    }

    async fn load(&self, id: Uuid) -> Result<Contract, DomainError> {
        self.contract_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::fixtures::{contract_with_status, date, provider_input};
    use crate::domain::{ContractRenewal, RenewalEffect, RenewalSubStatus, UserRole};
    use crate::repositories::{MockActivityRecorder, MockContractRepository, MockRenewalRepository};
    use crate::services::test_support::{actor, expect_activity, no_activity};

    fn service(
        contracts: MockContractRepository,
        renewals: MockRenewalRepository,
        recorder: MockActivityRecorder,
    ) -> ContractService {
        ContractService::new(Arc::new(contracts), Arc::new(renewals), Arc::new(recorder))
    }

    fn returning_contract(repo: &mut MockContractRepository, contract: Contract) {
        repo.expect_find_by_id().returning(move |_| Ok(Some(contract.clone())));
    }

    #[tokio::test]
    async fn test_create_contract() {
        let mut repo = MockContractRepository::new();
        repo.expect_find_by_number().returning(|_| Ok(None));
        repo.expect_create().times(1).returning(|c| Ok(c.clone()));

        let service = service(repo, MockRenewalRepository::new(), expect_activity("CONTRACT_CREATED"));
        let created = service.create(&actor(UserRole::Manager), provider_input()).await.unwrap();
        assert_eq!(created.status, ContractStatus::Draft);
        assert_eq!(created.contract_number, "PRV-2024-001");
    }

    #[tokio::test]
    async fn test_create_duplicate_number_conflicts() {
        let existing = contract_with_status(ContractStatus::Active);
        let mut repo = MockContractRepository::new();
        repo.expect_find_by_number().returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().never();

        let service = service(repo, MockRenewalRepository::new(), no_activity());
        let err = service.create(&actor(UserRole::Admin), provider_input()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_agent_cannot_create_contracts() {
        let service = service(MockContractRepository::new(), MockRenewalRepository::new(), no_activity());
        let err = service.create(&actor(UserRole::Agent), provider_input()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_status() {
        let contract = contract_with_status(ContractStatus::Active);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract.clone());
        repo.expect_find_by_number().returning(move |_| Ok(Some(contract.clone())));
        repo.expect_update()
            .withf(|c| c.status == ContractStatus::Active && c.name == "SMS Gateway v2")
            .returning(|c| Ok(c.clone()));

        let mut input = provider_input();
        input.name = "SMS Gateway v2".into();
        input.status = Some(ContractStatus::Draft);

        let service = service(repo, MockRenewalRepository::new(), expect_activity("CONTRACT_UPDATED"));
        let updated = service.update(&actor(UserRole::Manager), id, input).await.unwrap();
        assert_eq!(updated.status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn test_change_status_without_renewal_skips_renewal_lookup() {
        let contract = contract_with_status(ContractStatus::Draft);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_apply_status_change()
            .withf(|change| change.log.new_status == ContractStatus::Active && change.renewal == RenewalEffect::None)
            .returning(|change| Ok(change.contract.clone()));
        let mut renewals = MockRenewalRepository::new();
        renewals.expect_find_active().never();

        let service = service(repo, renewals, expect_activity("CONTRACT_STATUS_CHANGED"));
        let updated = service
            .change_status(&actor(UserRole::Manager), id, ContractStatus::Active, None)
            .await
            .unwrap();
        assert_eq!(updated.status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn test_entering_renewal_opens_renewal() {
        let contract = contract_with_status(ContractStatus::Active);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_apply_status_change()
            .withf(|change| match &change.renewal {
                RenewalEffect::Open(r) => {
                    r.sub_status == RenewalSubStatus::DocumentCollection && r.proposed_start_date == date(2024, 12, 31)
                }
                _ => false,
            })
            .returning(|change| Ok(change.contract.clone()));
        let mut renewals = MockRenewalRepository::new();
        renewals.expect_find_active().returning(|_| Ok(None));

        let service = service(repo, renewals, expect_activity("CONTRACT_STATUS_CHANGED"));
        service
            .change_status(&actor(UserRole::Admin), id, ContractStatus::RenewalInProgress, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_leaving_renewal_closes_active_renewal() {
        let contract = contract_with_status(ContractStatus::RenewalInProgress);
        let id = contract.id;
        let renewal = ContractRenewal::open(&contract, RenewalSubStatus::LegalReview, None, None, Utc::now());
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_apply_status_change()
            .withf(|change| match &change.renewal {
                RenewalEffect::Close(r) => {
                    !r.is_active && r.internal_notes.as_deref() == Some("Status changed to TERMINATED: fraud")
                }
                _ => false,
            })
            .returning(|change| Ok(change.contract.clone()));
        let mut renewals = MockRenewalRepository::new();
        renewals.expect_find_active().returning(move |_| Ok(Some(renewal.clone())));

        let service = service(repo, renewals, expect_activity("CONTRACT_STATUS_CHANGED"));
        service
            .change_status(&actor(UserRole::Admin), id, ContractStatus::Terminated, Some("fraud".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let contract = contract_with_status(ContractStatus::Terminated);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_apply_status_change().never();

        let service = service(repo, MockRenewalRepository::new(), no_activity());
        let err = service
            .change_status(&actor(UserRole::Admin), id, ContractStatus::Active, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change status from TERMINATED to ACTIVE");
    }

    #[tokio::test]
    async fn test_expiring_filters_active_and_computes_days() {
        let mut soon = contract_with_status(ContractStatus::Active);
        soon.end_date = date(2024, 12, 10);
        let mut draft = contract_with_status(ContractStatus::Draft);
        draft.end_date = date(2024, 12, 5);
        let mut repo = MockContractRepository::new();
        repo.expect_find_expiring()
            .withf(|from, to| *from == date(2024, 12, 1) && *to == date(2024, 12, 31))
            .returning(move |_, _| Ok(vec![soon.clone(), draft.clone()]));

        let service = service(repo, MockRenewalRepository::new(), no_activity());
        let expiring = service
            .expiring(&actor(UserRole::Agent), 30, date(2024, 12, 1))
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].days_until_expiration, 9);
    }

    #[tokio::test]
    async fn test_expire_overdue_moves_active_contracts() {
        let overdue = vec![
            contract_with_status(ContractStatus::Active),
            contract_with_status(ContractStatus::Active),
        ];
        let mut repo = MockContractRepository::new();
        repo.expect_find_overdue().returning(move |_| Ok(overdue.clone()));
        repo.expect_apply_status_change()
            .times(2)
            .withf(|change| change.log.changed_by_id.is_none() && change.contract.status == ContractStatus::Expired)
            .returning(|change| Ok(change.contract.clone()));

        let mut recorder = MockActivityRecorder::new();
        recorder
            .expect_record()
            .withf(|e| e.action == "CONTRACT_EXPIRED" && e.user_id.is_none() && e.severity == Severity::Warning)
            .times(2)
            .return_const(());

        let service = service(repo, MockRenewalRepository::new(), recorder);
        let count = service.expire_overdue(date(2025, 1, 2), Utc::now()).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_expire_overdue_skips_contract_changed_concurrently() {
        let terminated_meanwhile = contract_with_status(ContractStatus::Active);
        let raced_id = terminated_meanwhile.id;
        let overdue = vec![terminated_meanwhile, contract_with_status(ContractStatus::Active)];
        let mut repo = MockContractRepository::new();
        repo.expect_find_overdue().returning(move |_| Ok(overdue.clone()));
        repo.expect_apply_status_change()
            .times(2)
            .withf(|change| change.log.old_status == ContractStatus::Active)
            .returning(move |change| {
                if change.contract.id == raced_id {
                    Err(DomainError::Conflict("Contract status was changed concurrently".into()))
                } else {
                    Ok(change.contract.clone())
                }
            });

        let service = service(repo, MockRenewalRepository::new(), expect_activity("CONTRACT_EXPIRED"));
        let count = service.expire_overdue(date(2025, 1, 2), Utc::now()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_change_status_surfaces_stale_write_as_conflict() {
        let contract = contract_with_status(ContractStatus::Draft);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_apply_status_change()
            .returning(|_| Err(DomainError::Conflict("Contract status was changed concurrently".into())));

        let service = service(repo, MockRenewalRepository::new(), no_activity());
        let err = service
            .change_status(&actor(UserRole::Manager), id, ContractStatus::Active, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_records_warning() {
        let contract = contract_with_status(ContractStatus::Draft);
        let id = contract.id;
        let mut repo = MockContractRepository::new();
        returning_contract(&mut repo, contract);
        repo.expect_delete().times(1).returning(|_| Ok(()));

        let service = service(repo, MockRenewalRepository::new(), expect_activity("CONTRACT_DELETED"));
        service.delete(&actor(UserRole::Admin), id).await.unwrap();

        let service = ContractService::new(
            Arc::new(MockContractRepository::new()),
            Arc::new(MockRenewalRepository::new()),
            Arc::new(no_activity()),
        );
        assert!(service.delete(&actor(UserRole::Manager), id).await.is_err());
    }
}
