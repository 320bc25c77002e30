// ============================================================================
// BizHub Core - Contract Renewal
// File: crates/bizhub-core/src/domain/renewal.rs
// Description: Renewal approval stages, checklist flags and the renewal record
// ============================================================================

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizhub_shared::constants::RENEWAL_TERM_DAYS;

use super::contract::Contract;
use crate::error::DomainError;

/// Approval stage of an active contract renewal, in process order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenewalSubStatus {
    DocumentCollection,
    LegalReview,
    TechnicalReview,
    FinancialApproval,
    ManagementApproval,
    AwaitingSignature,
    FinalProcessing,
}

impl RenewalSubStatus {
    pub const ALL: [RenewalSubStatus; 7] = [
        RenewalSubStatus::DocumentCollection,
        RenewalSubStatus::LegalReview,
        RenewalSubStatus::TechnicalReview,
        RenewalSubStatus::FinancialApproval,
        RenewalSubStatus::ManagementApproval,
        RenewalSubStatus::AwaitingSignature,
        RenewalSubStatus::FinalProcessing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenewalSubStatus::DocumentCollection => "DOCUMENT_COLLECTION",
            RenewalSubStatus::LegalReview => "LEGAL_REVIEW",
            RenewalSubStatus::TechnicalReview => "TECHNICAL_REVIEW",
            RenewalSubStatus::FinancialApproval => "FINANCIAL_APPROVAL",
            RenewalSubStatus::ManagementApproval => "MANAGEMENT_APPROVAL",
            RenewalSubStatus::AwaitingSignature => "AWAITING_SIGNATURE",
            RenewalSubStatus::FinalProcessing => "FINAL_PROCESSING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s.trim().to_uppercase())
    }

    /// Zero-based position in the approval process.
    pub fn position(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// A renewal moves forward one stage at a time, or is sent back to any
    /// earlier stage for rework. Final processing is only left by completion.
    pub fn can_progress_to(&self, to: RenewalSubStatus) -> bool {
        if *self == RenewalSubStatus::FinalProcessing {
            return false;
        }
        Some(to) == self.next() || to < *self
    }

    pub fn validate_progression(&self, to: RenewalSubStatus) -> Result<(), DomainError> {
        if self.can_progress_to(to) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(self.as_str(), to.as_str()))
        }
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Default for RenewalSubStatus {
    fn default() -> Self {
        RenewalSubStatus::DocumentCollection
    }
}

impl std::fmt::Display for RenewalSubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval flags. Each one is set once its stage has been passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalChecklist {
    pub documents_received: bool,
    pub legal_approved: bool,
    pub technical_approved: bool,
    pub financial_approved: bool,
    pub management_approved: bool,
    pub signature_received: bool,
}

impl RenewalChecklist {
    pub const FLAG_COUNT: usize = 6;

    /// Flags of every stage strictly before `stage` are set, the rest cleared.
    pub fn for_stage(stage: RenewalSubStatus) -> Self {
        let passed = |s: RenewalSubStatus| s < stage;
        Self {
            documents_received: passed(RenewalSubStatus::DocumentCollection),
            legal_approved: passed(RenewalSubStatus::LegalReview),
            technical_approved: passed(RenewalSubStatus::TechnicalReview),
            financial_approved: passed(RenewalSubStatus::FinancialApproval),
            management_approved: passed(RenewalSubStatus::ManagementApproval),
            signature_received: passed(RenewalSubStatus::AwaitingSignature),
        }
    }

    pub fn completed_count(&self) -> usize {
        [
            self.documents_received,
            self.legal_approved,
            self.technical_approved,
            self.financial_approved,
            self.management_approved,
            self.signature_received,
        ]
        .into_iter()
        .filter(|f| *f)
        .count()
    }

    pub fn progress_percentage(&self) -> u8 {
        ((self.completed_count() as f64 / Self::FLAG_COUNT as f64) * 100.0).round() as u8
    }
}

/// Renewal process attached to a contract in `RENEWAL_IN_PROGRESS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRenewal {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub sub_status: RenewalSubStatus,
    pub proposed_start_date: NaiveDate,
    pub proposed_end_date: NaiveDate,
    pub proposed_revenue: f64,
    #[serde(flatten)]
    pub checklist: RenewalChecklist,
    pub comments: Option<String>,
    pub internal_notes: Option<String>,
    pub is_active: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by_id: Option<Uuid>,
    pub last_modified_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractRenewal {
    /// Opens a renewal proposing one more term starting where the contract ends.
    pub fn open(
        contract: &Contract,
        stage: RenewalSubStatus,
        comments: Option<String>,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id: contract.id,
            sub_status: stage,
            proposed_start_date: contract.end_date,
            proposed_end_date: contract.end_date + Duration::days(RENEWAL_TERM_DAYS),
            proposed_revenue: contract.revenue_percentage,
            checklist: RenewalChecklist::for_stage(stage),
            comments: Some(comments.unwrap_or_else(|| "Renewal process started".to_string())),
            internal_notes: None,
            is_active: true,
            completed_at: None,
            created_by_id: created_by,
            last_modified_by_id: created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn progress_percentage(&self) -> u8 {
        self.checklist.progress_percentage()
    }

    pub fn is_completable(&self) -> bool {
        self.is_active && self.sub_status == RenewalSubStatus::FinalProcessing
    }

    /// Moves to `to`, rewriting the checklist for the new stage.
    pub fn move_to(
        &mut self,
        to: RenewalSubStatus,
        comments: Option<String>,
        modified_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::Conflict("Renewal is no longer active".to_string()));
        }
        self.sub_status.validate_progression(to)?;

        self.sub_status = to;
        self.checklist = RenewalChecklist::for_stage(to);
        if comments.is_some() {
            self.comments = comments;
        }
        self.last_modified_by_id = Some(modified_by);
        self.updated_at = now;
        Ok(())
    }

    /// Closes the renewal and appends `note` to the internal notes.
    pub fn close(&mut self, note: String, closed_by: Option<Uuid>, now: DateTime<Utc>) {
        self.is_active = false;
        self.completed_at = Some(now);
        self.internal_notes = Some(match self.internal_notes.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, note),
            _ => note,
        });
        if closed_by.is_some() {
            self.last_modified_by_id = closed_by;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RenewalSubStatus::*;

    #[test]
    fn test_forward_one_step_only() {
        assert!(DocumentCollection.can_progress_to(LegalReview));
        assert!(LegalReview.can_progress_to(TechnicalReview));
        assert!(!DocumentCollection.can_progress_to(TechnicalReview));
        assert!(!DocumentCollection.can_progress_to(FinalProcessing));
        assert!(AwaitingSignature.can_progress_to(FinalProcessing));
    }

    #[test]
    fn test_back_to_any_earlier_stage() {
        assert!(ManagementApproval.can_progress_to(DocumentCollection));
        assert!(ManagementApproval.can_progress_to(LegalReview));
        assert!(!ManagementApproval.can_progress_to(ManagementApproval));
    }

    #[test]
    fn test_final_processing_is_not_left_by_progression() {
        for stage in RenewalSubStatus::ALL {
            assert!(!FinalProcessing.can_progress_to(stage));
        }
    }

    #[test]
    fn test_next_and_position() {
        assert_eq!(DocumentCollection.position(), 0);
        assert_eq!(FinalProcessing.position(), 6);
        assert_eq!(AwaitingSignature.next(), Some(FinalProcessing));
        assert_eq!(FinalProcessing.next(), None);
    }

    #[test]
    fn test_checklist_follows_stage() {
        assert_eq!(RenewalChecklist::for_stage(DocumentCollection), RenewalChecklist::default());

        let legal = RenewalChecklist::for_stage(LegalReview);
        assert!(legal.documents_received);
        assert!(!legal.legal_approved);

        let final_stage = RenewalChecklist::for_stage(FinalProcessing);
        assert_eq!(final_stage.completed_count(), RenewalChecklist::FLAG_COUNT);
        assert_eq!(final_stage.progress_percentage(), 100);

        assert_eq!(RenewalChecklist::for_stage(FinancialApproval).progress_percentage(), 50);
        assert_eq!(RenewalChecklist::for_stage(LegalReview).progress_percentage(), 17);
    }

    #[test]
    fn test_parse_sub_status() {
        assert_eq!(RenewalSubStatus::from_str("legal_review"), Some(LegalReview));
        assert_eq!(RenewalSubStatus::from_str("signed"), None);
    }
}
