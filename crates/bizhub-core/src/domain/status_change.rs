// ============================================================================
// BizHub Core - Contract Status Change
// File: crates/bizhub-core/src/domain/status_change.rs
// Description: Plans the rows written together when a contract changes status
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::contract::{Contract, ContractStatusLog};
use super::contract_status::ContractStatus;
use super::renewal::{ContractRenewal, RenewalSubStatus};
use crate::error::DomainError;

/// What happens to the contract's renewal record alongside a status change
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalEffect {
    None,
    /// Insert a new active renewal
    Open(ContractRenewal),
    /// Persist the given renewal, already closed
    Close(ContractRenewal),
}

/// A validated status change, persisted in a single transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ContractStatusChange {
    pub contract: Contract,
    pub log: ContractStatusLog,
    pub renewal: RenewalEffect,
}

#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    pub new_status: ContractStatus,
    pub comments: Option<String>,
    pub changed_by: Option<Uuid>,
    /// Stage of the renewal opened when entering `RENEWAL_IN_PROGRESS`
    pub renewal_stage: RenewalSubStatus,
}

impl StatusChangeRequest {
    pub fn new(new_status: ContractStatus, comments: Option<String>, changed_by: Option<Uuid>) -> Self {
        Self {
            new_status,
            comments,
            changed_by,
            renewal_stage: RenewalSubStatus::DocumentCollection,
        }
    }
}

/// Values that replace the renewal proposal when completing a renewal
#[derive(Debug, Clone, Default)]
pub struct RenewalCompletion {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub revenue_percentage: Option<f64>,
    pub comments: Option<String>,
}

impl ContractStatusChange {
    /// Validates the transition and derives the renewal side effect:
    /// entering renewal opens one unless already open, leaving renewal closes
    /// the active one.
    pub fn plan(
        contract: &Contract,
        active_renewal: Option<ContractRenewal>,
        request: StatusChangeRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let old_status = contract.status;
        let new_status = request.new_status;
        old_status.validate_transition(new_status)?;

        let mut updated = contract.clone();
        updated.status = new_status;
        updated.updated_at = now;
        if request.changed_by.is_some() {
            updated.last_modified_by_id = request.changed_by;
        }

        let renewal = if new_status == ContractStatus::RenewalInProgress {
            match active_renewal {
                Some(_) => RenewalEffect::None,
                None => RenewalEffect::Open(ContractRenewal::open(
                    &updated,
                    request.renewal_stage,
                    request.comments.clone(),
                    request.changed_by,
                    now,
                )),
            }
        } else if old_status == ContractStatus::RenewalInProgress {
            match active_renewal {
                Some(mut renewal) => {
                    let note = match request.comments.as_deref() {
                        Some(c) if !c.trim().is_empty() => format!("Status changed to {}: {}", new_status, c.trim()),
                        _ => format!("Status changed to {}", new_status),
                    };
                    renewal.close(note, request.changed_by, now);
                    RenewalEffect::Close(renewal)
                }
                None => RenewalEffect::None,
            }
        } else {
            RenewalEffect::None
        };

        let log = ContractStatusLog {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            old_status,
            new_status,
            comments: request.comments,
            changed_by_id: request.changed_by,
            changed_at: now,
        };

        Ok(Self { contract: updated, log, renewal })
    }

    /// Reactivates the contract for the renewed term and closes the renewal.
    /// The renewal must have reached final processing.
    pub fn complete_renewal(
        contract: &Contract,
        mut renewal: ContractRenewal,
        completion: RenewalCompletion,
        completed_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !renewal.is_completable() {
            return Err(DomainError::ValidationError(format!(
                "Renewal must be in {} to complete (currently {})",
                RenewalSubStatus::FinalProcessing.label(),
                renewal.sub_status.label()
            )));
        }
        contract.status.validate_transition(ContractStatus::Active)?;

        let start_date = completion.start_date.unwrap_or(renewal.proposed_start_date);
        let end_date = completion.end_date.unwrap_or(renewal.proposed_end_date);
        if end_date <= start_date {
            return Err(DomainError::ValidationError("End date must be after start date".to_string()));
        }
        let revenue = completion.revenue_percentage.unwrap_or(renewal.proposed_revenue);
        if !(0.0..=100.0).contains(&revenue) {
            return Err(DomainError::ValidationError(
                "Revenue percentage must be between 0 and 100".to_string(),
            ));
        }

        let mut updated = contract.clone();
        updated.status = ContractStatus::Active;
        updated.start_date = start_date;
        updated.end_date = end_date;
        updated.revenue_percentage = revenue;
        updated.last_modified_by_id = Some(completed_by);
        updated.updated_at = now;

        let comments = completion
            .comments
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Renewal process completed".to_string());
        renewal.close(format!("Renewal completed: {}", comments), Some(completed_by), now);

        let log = ContractStatusLog {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            old_status: contract.status,
            new_status: ContractStatus::Active,
            comments: Some(comments),
            changed_by_id: Some(completed_by),
            changed_at: now,
        };

        Ok(Self { contract: updated, log, renewal: RenewalEffect::Close(renewal) })
    }
}
