// ============================================================================
// BizHub Core - Humanitarian Renewal Service
// File: crates/bizhub-core/src/services/humanitarian_renewal_service.rs
// ============================================================================
//! Renewal tracker for humanitarian organization contracts

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use bizhub_shared::{Page, Pagination};

use crate::domain::{
    ActivityAction, ActivityLog, Actor, ContractType, CreateHumanitarianRenewalInput, EntityKind,
    HumanitarianRenewal, HumanitarianRenewalDetails, HumanitarianRenewalFilter, Severity,
    UpdateHumanitarianRenewalInput, UserRole,
};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ActivityRecorder, ContractRepository, HumanitarianRenewalRepository};
use crate::statistics::{humanitarian_renewal_stats, HumanitarianRenewalStats};

const DELETE_ROLES: [UserRole; 2] = [UserRole::Admin, UserRole::Manager];

pub struct HumanitarianRenewalService {
    renewal_repo: Arc<dyn HumanitarianRenewalRepository>,
    contract_repo: Arc<dyn ContractRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl HumanitarianRenewalService {
    pub fn new(
        renewal_repo: Arc<dyn HumanitarianRenewalRepository>,
        contract_repo: Arc<dyn ContractRepository>,
        activity: Arc<dyn ActivityRecorder>,
    ) -> Self {
        Self {
            renewal_repo,
            contract_repo,
            activity,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateHumanitarianRenewalInput,
    ) -> Result<HumanitarianRenewal, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::Create)?;

        // 1. Contract must be a humanitarian contract of this organization
        let contract = self
            .contract_repo
            .find_by_id(input.contract_id)
            .await?
            .filter(|c| {
                c.contract_type == ContractType::Humanitarian && c.humanitarian_org_id == Some(input.humanitarian_org_id)
            })
            .ok_or_else(|| DomainError::not_found("Humanitarian contract", input.contract_id))?;

        // 2. Only one open renewal per contract
        if self.renewal_repo.find_open_for_contract(contract.id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Contract {} already has a renewal in progress",
                contract.contract_number
            )));
        }

        // 3. Validate and persist
        let renewal = HumanitarianRenewal::new(input, actor.user_id)?;
        let created = self.renewal_repo.create(&renewal).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::CreateHumanitarianRenewal, EntityKind::HumanitarianRenewal)
                .entity_id(created.id)
                .user(actor.user_id)
                .json(json!({
                    "contract_number": contract.contract_number,
                    "sub_status": created.sub_status.as_str(),
                }))
                .build(),
        );
        info!("Humanitarian renewal created for contract {}", contract.contract_number);

        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateHumanitarianRenewalInput,
    ) -> Result<HumanitarianRenewal, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::Update)?;

        let details = self.load(id).await?;
        let previous = details.renewal.sub_status;
        let mut renewal = details.renewal;
        renewal.apply_update(input, actor.user_id)?;
        let updated = self.renewal_repo.update(&renewal).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::UpdateHumanitarianRenewal, EntityKind::HumanitarianRenewal)
                .entity_id(id)
                .user(actor.user_id)
                .json(json!({
                    "contract_number": details.contract_number,
                    "from": previous.as_str(),
                    "to": updated.sub_status.as_str(),
                    "progress": updated.progress_percentage(),
                }))
                .build(),
        );
        info!("Humanitarian renewal {} updated", id);

        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require_role(actor, &DELETE_ROLES, "delete humanitarian renewals")?;

        let details = self.load(id).await?;
        if details.renewal.sub_status.is_final() {
            return Err(DomainError::Conflict(format!(
                "Renewal for contract {} is in final processing and cannot be deleted",
                details.contract_number
            )));
        }
        self.renewal_repo.delete_many(&[id]).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::DeleteHumanitarianRenewal, EntityKind::HumanitarianRenewal)
                .entity_id(id)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .json(json!({ "contract_number": details.contract_number }))
                .build(),
        );
        warn!("Humanitarian renewal {} deleted by {}", id, actor.user_id);
        Ok(())
    }

    /// Deletes all of `ids` or nothing: one renewal in final processing
    /// rejects the whole request.
    pub async fn bulk_delete(&self, actor: &Actor, ids: &[Uuid]) -> Result<u64, DomainError> {
        policy::require_role(actor, &DELETE_ROLES, "delete humanitarian renewals")?;
        if ids.is_empty() {
            return Err(DomainError::validation(vec!["At least one renewal id is required".into()]));
        }

        let found = self.renewal_repo.find_by_ids(ids).await?;
        if found.is_empty() {
            return Err(DomainError::not_found("Humanitarian renewals", format!("{} ids", ids.len())));
        }

        let blocked: Vec<&str> = found
            .iter()
            .filter(|d| d.renewal.sub_status.is_final())
            .map(|d| d.contract_number.as_str())
            .collect();
        if !blocked.is_empty() {
            return Err(DomainError::Conflict(format!(
                "Renewals in final processing cannot be deleted: {}",
                blocked.join(", ")
            )));
        }

        let found_ids: Vec<Uuid> = found.iter().map(|d| d.renewal.id).collect();
        let deleted = self.renewal_repo.delete_many(&found_ids).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::DeleteHumanitarianRenewal, EntityKind::HumanitarianRenewal)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .json(json!({
                    "ids": found_ids,
                    "contract_numbers": found.iter().map(|d| d.contract_number.as_str()).collect::<Vec<_>>(),
                    "deleted": deleted,
                }))
                .build(),
        );
        warn!("{} humanitarian renewals deleted by {}", deleted, actor.user_id);

        Ok(deleted)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<HumanitarianRenewalDetails, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::View)?;
        self.load(id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &HumanitarianRenewalFilter,
        page: Pagination,
    ) -> Result<Page<HumanitarianRenewalDetails>, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::View)?;
        self.renewal_repo.list(filter, page).await
    }

    pub async fn statistics(&self, actor: &Actor, now: DateTime<Utc>) -> Result<HumanitarianRenewalStats, DomainError> {
        policy::require(actor, Resource::Humanitarian, Action::View)?;
        let renewals = self.renewal_repo.find_all().await?;
        Ok(humanitarian_renewal_stats(&renewals, now))
    }

    async fn load(&self, id: Uuid) -> Result<HumanitarianRenewalDetails, DomainError> {
        self.renewal_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Humanitarian renewal", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::fixtures::{contract_with_status, date};
    use crate::domain::{Contract, ContractStatus, HumanitarianRenewalStatus};
    use crate::repositories::{MockContractRepository, MockHumanitarianRenewalRepository};
    use crate::services::test_support::{actor, expect_activity, no_activity};

    fn humanitarian_contract() -> Contract {
        let mut contract = contract_with_status(ContractStatus::Active);
        contract.contract_type = ContractType::Humanitarian;
        contract.provider_id = None;
        contract.humanitarian_org_id = Some(Uuid::new_v4());
        contract.contract_number = "HUM-2024-007".into();
        contract
    }

    fn create_input(contract: &Contract) -> CreateHumanitarianRenewalInput {
        CreateHumanitarianRenewalInput {
            contract_id: contract.id,
            humanitarian_org_id: contract.humanitarian_org_id.unwrap(),
            proposed_start_date: date(2025, 1, 1),
            proposed_end_date: date(2025, 12, 31),
            proposed_revenue: Some(5.0),
            sub_status: None,
            notes: None,
            documents_received: false,
            legal_approved: false,
            financial_approved: false,
            signature_received: false,
        }
    }

    fn details(contract: &Contract, status: HumanitarianRenewalStatus) -> HumanitarianRenewalDetails {
        let mut renewal = HumanitarianRenewal::new(create_input(contract), Uuid::new_v4()).unwrap();
        renewal.sub_status = status;
        HumanitarianRenewalDetails {
            progress_percentage: renewal.progress_percentage(),
            renewal,
            contract_number: contract.contract_number.clone(),
            contract_name: contract.name.clone(),
            organization_name: "Red Cross".into(),
        }
    }

    fn service(
        renewals: MockHumanitarianRenewalRepository,
        contracts: MockContractRepository,
        recorder: crate::repositories::MockActivityRecorder,
    ) -> HumanitarianRenewalService {
        HumanitarianRenewalService::new(Arc::new(renewals), Arc::new(contracts), Arc::new(recorder))
    }

    #[tokio::test]
    async fn test_create_for_matching_contract() {
        let contract = humanitarian_contract();
        let input = create_input(&contract);
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().returning(move |_| Ok(Some(contract.clone())));
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals.expect_find_open_for_contract().returning(|_| Ok(None));
        renewals.expect_create().returning(|r| Ok(r.clone()));

        let service = service(renewals, contracts, expect_activity("CREATE_HUMANITARIAN_RENEWAL"));
        let created = service.create(&actor(UserRole::Manager), input).await.unwrap();
        assert_eq!(created.sub_status, HumanitarianRenewalStatus::DocumentCollection);
    }

    #[tokio::test]
    async fn test_create_with_wrong_organization_is_not_found() {
        let contract = humanitarian_contract();
        let mut input = create_input(&contract);
        input.humanitarian_org_id = Uuid::new_v4();
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().returning(move |_| Ok(Some(contract.clone())));

        let service = service(MockHumanitarianRenewalRepository::new(), contracts, no_activity());
        let err = service.create(&actor(UserRole::Admin), input).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_for_provider_contract_is_not_found() {
        let mut contract = humanitarian_contract();
        contract.contract_type = ContractType::Provider;
        let input = create_input(&contract);
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().returning(move |_| Ok(Some(contract.clone())));

        let service = service(MockHumanitarianRenewalRepository::new(), contracts, no_activity());
        assert!(matches!(
            service.create(&actor(UserRole::Admin), input).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_conflicts_with_open_renewal() {
        let contract = humanitarian_contract();
        let input = create_input(&contract);
        let open = details(&contract, HumanitarianRenewalStatus::LegalReview).renewal;
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().returning(move |_| Ok(Some(contract.clone())));
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals.expect_find_open_for_contract().returning(move |_| Ok(Some(open.clone())));
        renewals.expect_create().never();

        let service = service(renewals, contracts, no_activity());
        assert!(matches!(
            service.create(&actor(UserRole::Admin), input).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_moves_one_stage() {
        let contract = humanitarian_contract();
        let existing = details(&contract, HumanitarianRenewalStatus::FinancialApproval);
        let id = existing.renewal.id;
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals.expect_find_by_id().returning(move |_| Ok(Some(existing.clone())));
        renewals.expect_update().returning(|r| Ok(r.clone()));

        let service = service(renewals, MockContractRepository::new(), expect_activity("UPDATE_HUMANITARIAN_RENEWAL"));
        let updated = service
            .update(
                &actor(UserRole::Manager),
                id,
                UpdateHumanitarianRenewalInput {
                    sub_status: Some(HumanitarianRenewalStatus::AwaitingSignature),
                    financial_approved: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.sub_status, HumanitarianRenewalStatus::AwaitingSignature);
        assert_eq!(updated.progress_percentage(), 25);
    }

    #[tokio::test]
    async fn test_agent_cannot_delete() {
        let service = service(
            MockHumanitarianRenewalRepository::new(),
            MockContractRepository::new(),
            no_activity(),
        );
        assert!(matches!(
            service.delete(&actor(UserRole::Agent), Uuid::new_v4()).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_final_processing_rejected() {
        let contract = humanitarian_contract();
        let existing = details(&contract, HumanitarianRenewalStatus::FinalProcessing);
        let id = existing.renewal.id;
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals.expect_find_by_id().returning(move |_| Ok(Some(existing.clone())));
        renewals.expect_delete_many().never();

        let service = service(renewals, MockContractRepository::new(), no_activity());
        assert!(matches!(
            service.delete(&actor(UserRole::Manager), id).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_delete_rejects_whole_request_naming_contracts() {
        let contract = humanitarian_contract();
        let deletable = details(&contract, HumanitarianRenewalStatus::LegalReview);
        let blocked = details(&contract, HumanitarianRenewalStatus::FinalProcessing);
        let ids = vec![deletable.renewal.id, blocked.renewal.id];
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals
            .expect_find_by_ids()
            .returning(move |_| Ok(vec![deletable.clone(), blocked.clone()]));
        renewals.expect_delete_many().never();

        let service = service(renewals, MockContractRepository::new(), no_activity());
        let err = service.bulk_delete(&actor(UserRole::Admin), &ids).await.unwrap_err();
        assert!(err.to_string().contains("HUM-2024-007"));
    }

    #[tokio::test]
    async fn test_bulk_delete() {
        let contract = humanitarian_contract();
        let first = details(&contract, HumanitarianRenewalStatus::LegalReview);
        let second = details(&contract, HumanitarianRenewalStatus::DocumentCollection);
        let ids = vec![first.renewal.id, second.renewal.id];
        let mut renewals = MockHumanitarianRenewalRepository::new();
        renewals.expect_find_by_ids().returning(move |_| Ok(vec![first.clone(), second.clone()]));
        renewals
            .expect_delete_many()
            .withf(|ids| ids.len() == 2)
            .returning(|ids| Ok(ids.len() as u64));

        let service = service(renewals, MockContractRepository::new(), expect_activity("DELETE_HUMANITARIAN_RENEWAL"));
        assert_eq!(service.bulk_delete(&actor(UserRole::Manager), &ids).await.unwrap(), 2);
    }
}
