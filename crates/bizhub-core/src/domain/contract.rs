// ============================================================================
// BizHub Core - Contract Entity
// File: crates/bizhub-core/src/domain/contract.rs
// Description: Contracts with providers, humanitarian orgs and parking services
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use bizhub_shared::constants::DEFAULT_REVENUE_PERCENTAGE;

use super::contract_status::ContractStatus;
use crate::error::{validation_messages, DomainError};

/// Counterparty kind of a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    Provider,
    Humanitarian,
    Parking,
}

impl ContractType {
    pub const ALL: [ContractType; 3] = [ContractType::Provider, ContractType::Humanitarian, ContractType::Parking];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Provider => "PROVIDER",
            ContractType::Humanitarian => "HUMANITARIAN",
            ContractType::Parking => "PARKING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PROVIDER" => Some(ContractType::Provider),
            "HUMANITARIAN" => Some(ContractType::Humanitarian),
            "PARKING" => Some(ContractType::Parking),
            _ => None,
        }
    }
}

/// A catalog service covered by a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractServiceTerm {
    pub service_id: Uuid,
    pub specific_terms: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub name: String,
    pub contract_number: String,
    pub contract_type: ContractType,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue_percentage: f64,
    pub description: Option<String>,
    pub provider_id: Option<Uuid>,
    pub humanitarian_org_id: Option<Uuid>,
    pub parking_service_id: Option<Uuid>,
    pub is_revenue_sharing: bool,
    pub operator_revenue: Option<f64>,
    pub services: Vec<ContractServiceTerm>,
    pub created_by_id: Option<Uuid>,
    pub last_modified_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create / update payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContractInput {
    #[validate(length(min = 1, max = 200, message = "Contract name is required (max 200 characters)"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Contract number is required (max 100 characters)"))]
    pub contract_number: String,

    pub contract_type: ContractType,

    /// Only honoured on create
    pub status: Option<ContractStatus>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[validate(range(min = 0.0, max = 100.0, message = "Revenue percentage must be between 0 and 100"))]
    pub revenue_percentage: Option<f64>,

    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: Option<String>,

    pub provider_id: Option<Uuid>,
    pub humanitarian_org_id: Option<Uuid>,
    pub parking_service_id: Option<Uuid>,
    pub is_revenue_sharing: Option<bool>,

    #[validate(range(min = 0.0, message = "Operator revenue cannot be negative"))]
    pub operator_revenue: Option<f64>,

    #[serde(default)]
    pub services: Vec<ContractServiceTerm>,
}

impl ContractInput {
    /// Field checks plus the cross-field business rules. All problems are reported together.
    pub fn check(&self) -> Result<(), DomainError> {
        let mut messages = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_messages(&errors),
        };

        // whitespace-only values pass the length check
        if !self.name.is_empty() && self.name.trim().is_empty() {
            messages.push("Contract name is required".to_string());
        }
        if !self.contract_number.is_empty() && self.contract_number.trim().is_empty() {
            messages.push("Contract number is required".to_string());
        }
        if self.end_date <= self.start_date {
            messages.push("End date must be after start date".to_string());
        }

        match self.contract_type {
            ContractType::Provider if self.provider_id.is_none() => {
                messages.push("Provider is required for provider contracts".to_string())
            }
            ContractType::Humanitarian if self.humanitarian_org_id.is_none() => messages
                .push("Humanitarian organization is required for humanitarian contracts".to_string()),
            ContractType::Parking if self.parking_service_id.is_none() => {
                messages.push("Parking service is required for parking contracts".to_string())
            }
            _ => {}
        }

        if self.services.is_empty() {
            messages.push("At least one service must be selected".to_string());
        }

        if !self.is_revenue_sharing.unwrap_or(true) && self.operator_revenue.is_none() {
            messages.push("Operator revenue is required when revenue sharing is disabled".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(messages))
        }
    }

    /// Counterparty ids with only the one matching the contract type kept.
    fn counterparty(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match self.contract_type {
            ContractType::Provider => (self.provider_id, None, None),
            ContractType::Humanitarian => (None, self.humanitarian_org_id, None),
            ContractType::Parking => (None, None, self.parking_service_id),
        }
    }
}

/// How a contract relates to its expiry date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationStatus {
    Expired,
    ExpiringSoon,
    Active,
}

/// Days from `today` until `end_date`, negative once past.
pub fn days_until_expiration(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

pub fn expiration_status(end_date: NaiveDate, today: NaiveDate, threshold_days: i64) -> ExpirationStatus {
    let days = days_until_expiration(end_date, today);
    if days < 0 {
        ExpirationStatus::Expired
    } else if days <= threshold_days {
        ExpirationStatus::ExpiringSoon
    } else {
        ExpirationStatus::Active
    }
}

impl Contract {
    pub fn new(input: ContractInput, created_by: Uuid) -> Result<Self, DomainError> {
        input.check()?;

        let status = input.status.unwrap_or_default();
        if !status.is_initial() {
            return Err(DomainError::ValidationError(format!(
                "Contracts cannot be created with status {}",
                status.label()
            )));
        }

        let (provider_id, humanitarian_org_id, parking_service_id) = input.counterparty();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            contract_number: input.contract_number.trim().to_string(),
            contract_type: input.contract_type,
            status,
            start_date: input.start_date,
            end_date: input.end_date,
            revenue_percentage: input.revenue_percentage.unwrap_or(DEFAULT_REVENUE_PERCENTAGE),
            description: input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            provider_id,
            humanitarian_org_id,
            parking_service_id,
            is_revenue_sharing: input.is_revenue_sharing.unwrap_or(true),
            operator_revenue: input.operator_revenue,
            services: input.services,
            created_by_id: Some(created_by),
            last_modified_by_id: Some(created_by),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields. Status only changes through the state machine.
    pub fn apply_update(&mut self, input: ContractInput, modified_by: Uuid) -> Result<(), DomainError> {
        input.check()?;

        let (provider_id, humanitarian_org_id, parking_service_id) = input.counterparty();
        self.name = input.name.trim().to_string();
        self.contract_number = input.contract_number.trim().to_string();
        self.contract_type = input.contract_type;
        self.start_date = input.start_date;
        self.end_date = input.end_date;
        self.revenue_percentage = input.revenue_percentage.unwrap_or(self.revenue_percentage);
        self.description = input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        self.provider_id = provider_id;
        self.humanitarian_org_id = humanitarian_org_id;
        self.parking_service_id = parking_service_id;
        self.is_revenue_sharing = input.is_revenue_sharing.unwrap_or(self.is_revenue_sharing);
        self.operator_revenue = input.operator_revenue;
        self.services = input.services;
        self.last_modified_by_id = Some(modified_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn days_until_expiration(&self, today: NaiveDate) -> i64 {
        days_until_expiration(self.end_date, today)
    }

    pub fn expiration_status(&self, today: NaiveDate, threshold_days: i64) -> ExpirationStatus {
        expiration_status(self.end_date, today, threshold_days)
    }

    /// EXPIRED contracts, and ACTIVE ones whose end date has passed.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        match self.status {
            ContractStatus::Expired => true,
            ContractStatus::Active => self.end_date < today,
            _ => false,
        }
    }

    pub fn is_expiring_soon(&self, today: NaiveDate, threshold_days: i64) -> bool {
        self.status == ContractStatus::Active
            && self.expiration_status(today, threshold_days) == ExpirationStatus::ExpiringSoon
    }
}

/// One row of a contract's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStatusLog {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub old_status: ContractStatus,
    pub new_status: ContractStatus,
    pub comments: Option<String>,
    /// `None` for system changes such as the expiry sweep
    pub changed_by_id: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractFilter {
    pub status: Option<ContractStatus>,
    pub contract_type: Option<ContractType>,
    pub provider_id: Option<Uuid>,
    pub humanitarian_org_id: Option<Uuid>,
    pub parking_service_id: Option<Uuid>,
    pub search: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn provider_input() -> ContractInput {
        ContractInput {
            name: "SMS Gateway".to_string(),
            contract_number: "PRV-2024-001".to_string(),
            contract_type: ContractType::Provider,
            status: None,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            revenue_percentage: Some(12.5),
            description: None,
            provider_id: Some(Uuid::new_v4()),
            humanitarian_org_id: None,
            parking_service_id: None,
            is_revenue_sharing: None,
            operator_revenue: None,
            services: vec![ContractServiceTerm { service_id: Uuid::new_v4(), specific_terms: None }],
        }
    }

    pub fn contract_with_status(status: ContractStatus) -> Contract {
        let mut contract = Contract::new(provider_input(), Uuid::new_v4()).unwrap();
        contract.status = status;
        contract
    }
}
