// ============================================================================
// BizHub Core - Contract Renewal Service
// File: crates/bizhub-core/src/services/renewal_service.rs
// ============================================================================
//! Multi-stage renewal workflow attached to RENEWAL_IN_PROGRESS contracts

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    ActivityAction, ActivityLog, Actor, Contract, ContractRenewal, ContractStatus, ContractStatusChange,
    EntityKind, RenewalCompletion, RenewalEffect, RenewalSubStatus, StatusChangeRequest,
};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ActivityRecorder, ContractRepository, RenewalRepository};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRenewalInput {
    pub sub_status: Option<RenewalSubStatus>,
    pub comments: Option<String>,
}

pub struct RenewalService {
    contract_repo: Arc<dyn ContractRepository>,
    renewal_repo: Arc<dyn RenewalRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl RenewalService {
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

    /// Opens a renewal and moves the contract to RENEWAL_IN_PROGRESS.
    pub async fn start(
        &self,
        actor: &Actor,
        contract_id: Uuid,
        input: StartRenewalInput,
    ) -> Result<ContractRenewal, DomainError> {
        policy::require(actor, Resource::Contract, Action::Update)?;

        // 1. Contract must be allowed into renewal
        let contract = self.load_contract(contract_id).await?;
        contract.status.validate_transition(ContractStatus::RenewalInProgress)?;

        // 2. One active renewal per contract
        if self.renewal_repo.find_active(contract_id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Contract {} already has an active renewal",
                contract.contract_number
            )));
        }

        // 3. Plan and persist the move together with the new renewal
        let mut request = StatusChangeRequest::new(
            ContractStatus::RenewalInProgress,
            input.comments.clone(),
            Some(actor.user_id),
        );
        request.renewal_stage = input.sub_status.unwrap_or_default();
        let change = ContractStatusChange::plan(&contract, None, request, Utc::now())?;
        let RenewalEffect::Open(renewal) = change.renewal.clone() else {
            return Err(DomainError::InternalError("Renewal was not opened".to_string()));
        };
        self.contract_repo.apply_status_change(&change).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::RenewalStarted, EntityKind::ContractRenewal)
                .entity_id(renewal.id)
                .user(actor.user_id)
                .json(json!({
                    "contract_id": contract_id,
                    "contract_number": contract.contract_number,
                    "sub_status": renewal.sub_status.as_str(),
                }))
                .build(),
        );
        info!("Renewal started for contract {} at {}", contract.contract_number, renewal.sub_status);

        Ok(renewal)
    }

    pub async fn update_sub_status(
        &self,
        actor: &Actor,
        contract_id: Uuid,
        sub_status: RenewalSubStatus,
        comments: Option<String>,
    ) -> Result<ContractRenewal, DomainError> {
        policy::require(actor, Resource::Contract, Action::Update)?;

        let mut renewal = self.load_active(contract_id).await?;
        let previous = renewal.sub_status;
        renewal.move_to(sub_status, comments, actor.user_id, Utc::now())?;
        let updated = self.renewal_repo.update(&renewal, previous).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::RenewalSubStatusChanged, EntityKind::ContractRenewal)
                .entity_id(updated.id)
                .user(actor.user_id)
                .json(json!({
                    "contract_id": contract_id,
                    "from": previous.as_str(),
                    "to": sub_status.as_str(),
                }))
                .build(),
        );
        info!("Renewal {} moved {} -> {}", updated.id, previous, sub_status);

        Ok(updated)
    }

    /// Finishes a renewal in FINAL_PROCESSING: the contract becomes ACTIVE with
    /// the new term and the renewal is closed.
    pub async fn complete(
        &self,
        actor: &Actor,
        contract_id: Uuid,
        completion: RenewalCompletion,
    ) -> Result<Contract, DomainError> {
        policy::require(actor, Resource::Contract, Action::Update)?;

        let contract = self.load_contract(contract_id).await?;
        let renewal = self.load_active(contract_id).await?;
        let renewal_id = renewal.id;

        let change = ContractStatusChange::complete_renewal(&contract, renewal, completion, actor.user_id, Utc::now())?;
        let renewed = self.contract_repo.apply_status_change(&change).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ContractRenewed, EntityKind::Contract)
                .entity_id(contract_id)
                .user(actor.user_id)
                .json(json!({
                    "renewal_id": renewal_id,
                    "start_date": renewed.start_date,
                    "end_date": renewed.end_date,
                    "revenue_percentage": renewed.revenue_percentage,
                }))
                .build(),
        );
        info!(
            "Contract {} renewed until {}",
            renewed.contract_number, renewed.end_date
        );

        Ok(renewed)
    }

    pub async fn active_for_contract(
        &self,
        actor: &Actor,
        contract_id: Uuid,
    ) -> Result<Option<ContractRenewal>, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        self.load_contract(contract_id).await?;
        self.renewal_repo.find_active(contract_id).await
    }

    /// All renewals of a contract, newest first.
    pub async fn history(&self, actor: &Actor, contract_id: Uuid) -> Result<Vec<ContractRenewal>, DomainError> {
        policy::require(actor, Resource::Contract, Action::View)?;
        self.load_contract(contract_id).await?;
        self.renewal_repo.find_by_contract(contract_id).await
    }

    async fn load_contract(&self, id: Uuid) -> Result<Contract, DomainError> {
        self.contract_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", id))
    }

    async fn load_active(&self, contract_id: Uuid) -> Result<ContractRenewal, DomainError> {
        self.renewal_repo
            .find_active(contract_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Active renewal for contract", contract_id))
    }
}
