// ============================================================================
// BizHub Core - Humanitarian Renewal
// File: crates/bizhub-core/src/domain/humanitarian_renewal.rs
// Description: Renewal tracker for humanitarian organization contracts
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HumanitarianRenewalStatus {
    DocumentCollection,
    LegalReview,
    FinancialApproval,
    AwaitingSignature,
    FinalProcessing,
}

impl HumanitarianRenewalStatus {
    pub const ALL: [HumanitarianRenewalStatus; 5] = [
        HumanitarianRenewalStatus::DocumentCollection,
        HumanitarianRenewalStatus::LegalReview,
        HumanitarianRenewalStatus::FinancialApproval,
        HumanitarianRenewalStatus::AwaitingSignature,
        HumanitarianRenewalStatus::FinalProcessing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HumanitarianRenewalStatus::DocumentCollection => "DOCUMENT_COLLECTION",
            HumanitarianRenewalStatus::LegalReview => "LEGAL_REVIEW",
            HumanitarianRenewalStatus::FinancialApproval => "FINANCIAL_APPROVAL",
            HumanitarianRenewalStatus::AwaitingSignature => "AWAITING_SIGNATURE",
            HumanitarianRenewalStatus::FinalProcessing => "FINAL_PROCESSING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s.trim().to_uppercase())
    }

    pub fn label(&self) -> &'static str {
        match self {
            HumanitarianRenewalStatus::DocumentCollection => "Document collection",
            HumanitarianRenewalStatus::LegalReview => "Legal review",
            HumanitarianRenewalStatus::FinancialApproval => "Financial approval",
            HumanitarianRenewalStatus::AwaitingSignature => "Awaiting signature",
            HumanitarianRenewalStatus::FinalProcessing => "Final processing",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(*self as usize + 1).copied()
    }

    pub fn is_final(&self) -> bool {
        *self == HumanitarianRenewalStatus::FinalProcessing
    }

    /// Same progression rule as contract renewals: one step forward or back to any earlier stage.
    pub fn can_progress_to(&self, to: HumanitarianRenewalStatus) -> bool {
        if self.is_final() {
            return false;
        }
        Some(to) == self.next() || to < *self
    }
}

impl Default for HumanitarianRenewalStatus {
    fn default() -> Self {
        HumanitarianRenewalStatus::DocumentCollection
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanitarianRenewal {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub humanitarian_org_id: Uuid,
    pub proposed_start_date: NaiveDate,
    pub proposed_end_date: NaiveDate,
    pub proposed_revenue: Option<f64>,
    pub sub_status: HumanitarianRenewalStatus,
    pub documents_received: bool,
    pub legal_approved: bool,
    pub financial_approved: bool,
    pub signature_received: bool,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub last_modified_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Renewal joined with its contract and organization names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanitarianRenewalDetails {
    #[serde(flatten)]
    pub renewal: HumanitarianRenewal,
    pub contract_number: String,
    pub contract_name: String,
    pub organization_name: String,
    pub progress_percentage: u8,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHumanitarianRenewalInput {
    pub contract_id: Uuid,
    pub humanitarian_org_id: Uuid,
    pub proposed_start_date: NaiveDate,
    pub proposed_end_date: NaiveDate,

    #[validate(range(min = 0.0, max = 100.0, message = "Revenue percentage must be between 0 and 100"))]
    pub proposed_revenue: Option<f64>,

    pub sub_status: Option<HumanitarianRenewalStatus>,

    #[validate(length(max = 2000, message = "Notes too long"))]
    pub notes: Option<String>,

    #[serde(default)]
    pub documents_received: bool,
    #[serde(default)]
    pub legal_approved: bool,
    #[serde(default)]
    pub financial_approved: bool,
    #[serde(default)]
    pub signature_received: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateHumanitarianRenewalInput {
    pub proposed_start_date: Option<NaiveDate>,
    pub proposed_end_date: Option<NaiveDate>,

    #[validate(range(min = 0.0, max = 100.0, message = "Revenue percentage must be between 0 and 100"))]
    pub proposed_revenue: Option<f64>,

    pub sub_status: Option<HumanitarianRenewalStatus>,

    #[validate(length(max = 2000, message = "Notes too long"))]
    pub notes: Option<String>,

    pub documents_received: Option<bool>,
    pub legal_approved: Option<bool>,
    pub financial_approved: Option<bool>,
    pub signature_received: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HumanitarianRenewalFilter {
    pub sub_status: Option<HumanitarianRenewalStatus>,
    pub humanitarian_org_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    /// Bounds on the proposed start date
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn check_dates(start: NaiveDate, end: NaiveDate) -> Result<(), DomainError> {
    if end <= start {
        return Err(DomainError::ValidationError("End date must be after start date".to_string()));
    }
    Ok(())
}

impl HumanitarianRenewal {
    pub fn new(input: CreateHumanitarianRenewalInput, created_by: Uuid) -> Result<Self, DomainError> {
        input.validate()?;
        check_dates(input.proposed_start_date, input.proposed_end_date)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            contract_id: input.contract_id,
            humanitarian_org_id: input.humanitarian_org_id,
            proposed_start_date: input.proposed_start_date,
            proposed_end_date: input.proposed_end_date,
            proposed_revenue: input.proposed_revenue,
            sub_status: input.sub_status.unwrap_or_default(),
            documents_received: input.documents_received,
            legal_approved: input.legal_approved,
            financial_approved: input.financial_approved,
            signature_received: input.signature_received,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            created_by_id: created_by,
            last_modified_by_id: Some(created_by),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, input: UpdateHumanitarianRenewalInput, modified_by: Uuid) -> Result<(), DomainError> {
        input.validate()?;

        if let Some(to) = input.sub_status.filter(|s| *s != self.sub_status) {
            if !self.sub_status.can_progress_to(to) {
                return Err(DomainError::invalid_transition(self.sub_status.as_str(), to.as_str()));
            }
            self.sub_status = to;
        }

        let start = input.proposed_start_date.unwrap_or(self.proposed_start_date);
        let end = input.proposed_end_date.unwrap_or(self.proposed_end_date);
        check_dates(start, end)?;
        self.proposed_start_date = start;
        self.proposed_end_date = end;

        if input.proposed_revenue.is_some() {
            self.proposed_revenue = input.proposed_revenue;
        }
        if input.notes.is_some() {
            self.notes = input.notes.filter(|n| !n.trim().is_empty());
        }
        self.documents_received = input.documents_received.unwrap_or(self.documents_received);
        self.legal_approved = input.legal_approved.unwrap_or(self.legal_approved);
        self.financial_approved = input.financial_approved.unwrap_or(self.financial_approved);
        self.signature_received = input.signature_received.unwrap_or(self.signature_received);
        self.last_modified_by_id = Some(modified_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn completed_flags(&self) -> usize {
        [self.documents_received, self.legal_approved, self.financial_approved, self.signature_received]
            .into_iter()
            .filter(|f| *f)
            .count()
    }

    pub fn progress_percentage(&self) -> u8 {
        ((self.completed_flags() as f64 / 4.0) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HumanitarianRenewalStatus::*;

    fn input() -> CreateHumanitarianRenewalInput {
        CreateHumanitarianRenewalInput {
            contract_id: Uuid::new_v4(),
            humanitarian_org_id: Uuid::new_v4(),
            proposed_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            proposed_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            proposed_revenue: Some(5.0),
            sub_status: None,
            notes: Some("  ".to_string()),
            documents_received: true,
            legal_approved: false,
            financial_approved: false,
            signature_received: false,
        }
    }

    #[test]
    fn test_create_defaults() {
        let renewal = HumanitarianRenewal::new(input(), Uuid::new_v4()).unwrap();
        assert_eq!(renewal.sub_status, DocumentCollection);
        assert!(renewal.notes.is_none());
        assert_eq!(renewal.progress_percentage(), 25);
    }

    #[test]
    fn test_create_rejects_inverted_dates() {
        let mut bad = input();
        bad.proposed_end_date = bad.proposed_start_date;
        assert!(HumanitarianRenewal::new(bad, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_progression() {
        assert!(DocumentCollection.can_progress_to(LegalReview));
        assert!(!DocumentCollection.can_progress_to(FinancialApproval));
        assert!(AwaitingSignature.can_progress_to(LegalReview));
        assert!(!FinalProcessing.can_progress_to(AwaitingSignature));
    }

    #[test]
    fn test_update_rejects_skipping_stages() {
        let mut renewal = HumanitarianRenewal::new(input(), Uuid::new_v4()).unwrap();
        let update = UpdateHumanitarianRenewalInput {
            sub_status: Some(AwaitingSignature),
            ..Default::default()
        };
        assert!(matches!(
            renewal.apply_update(update, Uuid::new_v4()),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_update_flags_and_stage() {
        let mut renewal = HumanitarianRenewal::new(input(), Uuid::new_v4()).unwrap();
        let update = UpdateHumanitarianRenewalInput {
            sub_status: Some(LegalReview),
            legal_approved: Some(true),
            ..Default::default()
        };
        renewal.apply_update(update, Uuid::new_v4()).unwrap();
        assert_eq!(renewal.sub_status, LegalReview);
        assert_eq!(renewal.progress_percentage(), 50);
    }
}
