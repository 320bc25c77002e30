// ============================================================================
// BizHub Core - Activity Log
// File: crates/bizhub-core/src/domain/activity.rs
// Description: Append-only audit trail written alongside mutations
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audited actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    LoginFailed,
    UserCreated,
    UserRoleChanged,
    UserActivated,
    UserDeactivated,
    ContractCreated,
    ContractUpdated,
    ContractDeleted,
    ContractStatusChanged,
    ContractExpired,
    RenewalStarted,
    RenewalSubStatusChanged,
    ContractRenewed,
    CreateHumanitarianRenewal,
    UpdateHumanitarianRenewal,
    DeleteHumanitarianRenewal,
    ComplaintCreated,
    ComplaintUpdated,
    ComplaintStatusChanged,
    ComplaintAssigned,
    ComplaintDeleted,
    CommentAdded,
    ProviderCreated,
    ProviderUpdated,
    ProviderDeleted,
    HumanitarianOrgCreated,
    HumanitarianOrgUpdated,
    HumanitarianOrgDeleted,
    ParkingServiceCreated,
    ParkingServiceUpdated,
    ParkingServiceDeleted,
    ServiceCreated,
    ServiceUpdated,
    ServiceDeleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::UserCreated => "USER_CREATED",
            Self::UserRoleChanged => "USER_ROLE_CHANGED",
            Self::UserActivated => "USER_ACTIVATED",
            Self::UserDeactivated => "USER_DEACTIVATED",
            Self::ContractCreated => "CONTRACT_CREATED",
            Self::ContractUpdated => "CONTRACT_UPDATED",
            Self::ContractDeleted => "CONTRACT_DELETED",
            Self::ContractStatusChanged => "CONTRACT_STATUS_CHANGED",
            Self::ContractExpired => "CONTRACT_EXPIRED",
            Self::RenewalStarted => "RENEWAL_STARTED",
            Self::RenewalSubStatusChanged => "RENEWAL_SUB_STATUS_CHANGED",
            Self::ContractRenewed => "CONTRACT_RENEWED",
            Self::CreateHumanitarianRenewal => "CREATE_HUMANITARIAN_RENEWAL",
            Self::UpdateHumanitarianRenewal => "UPDATE_HUMANITARIAN_RENEWAL",
            Self::DeleteHumanitarianRenewal => "DELETE_HUMANITARIAN_RENEWAL",
            Self::ComplaintCreated => "COMPLAINT_CREATED",
            Self::ComplaintUpdated => "COMPLAINT_UPDATED",
            Self::ComplaintStatusChanged => "COMPLAINT_STATUS_CHANGED",
            Self::ComplaintAssigned => "COMPLAINT_ASSIGNED",
            Self::ComplaintDeleted => "COMPLAINT_DELETED",
            Self::CommentAdded => "COMMENT_ADDED",
            Self::ProviderCreated => "PROVIDER_CREATED",
            Self::ProviderUpdated => "PROVIDER_UPDATED",
            Self::ProviderDeleted => "PROVIDER_DELETED",
            Self::HumanitarianOrgCreated => "HUMANITARIAN_ORG_CREATED",
            Self::HumanitarianOrgUpdated => "HUMANITARIAN_ORG_UPDATED",
            Self::HumanitarianOrgDeleted => "HUMANITARIAN_ORG_DELETED",
            Self::ParkingServiceCreated => "PARKING_SERVICE_CREATED",
            Self::ParkingServiceUpdated => "PARKING_SERVICE_UPDATED",
            Self::ParkingServiceDeleted => "PARKING_SERVICE_DELETED",
            Self::ServiceCreated => "SERVICE_CREATED",
            Self::ServiceUpdated => "SERVICE_UPDATED",
            Self::ServiceDeleted => "SERVICE_DELETED",
        }
    }
}

/// Kind of entity an activity refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Contract,
    ContractRenewal,
    HumanitarianRenewal,
    Complaint,
    Provider,
    HumanitarianOrg,
    ParkingService,
    Service,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Contract => "contract",
            Self::ContractRenewal => "contract_renewal",
            Self::HumanitarianRenewal => "humanitarian_renewal",
            Self::Complaint => "complaint",
            Self::Provider => "provider",
            Self::HumanitarianOrg => "humanitarian_org",
            Self::ParkingService => "parking_service",
            Self::Service => "service",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INFO" => Some(Severity::Info),
            "WARNING" => Some(Severity::Warning),
            "ERROR" => Some(Severity::Error),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

/// One audit trail entry. Action and entity type are kept as text so rows
/// written by older releases still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub severity: Severity,
    /// `None` for system jobs
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Create builder for fluent API
    pub fn builder(action: ActivityAction, entity: EntityKind) -> ActivityLogBuilder {
        ActivityLogBuilder::new(action, entity)
    }
}

/// Builder pattern for ActivityLog
pub struct ActivityLogBuilder {
    log: ActivityLog,
}

impl ActivityLogBuilder {
    pub fn new(action: ActivityAction, entity: EntityKind) -> Self {
        Self {
            log: ActivityLog {
                id: Uuid::new_v4(),
                action: action.as_str().to_string(),
                entity_type: entity.as_str().to_string(),
                entity_id: None,
                details: None,
                severity: Severity::Info,
                user_id: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn entity_id(mut self, id: impl ToString) -> Self {
        self.log.entity_id = Some(id.to_string());
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.log.user_id = Some(user_id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.log.details = Some(details.into());
        self
    }

    /// Structured details, stored as JSON text.
    pub fn json(mut self, details: serde_json::Value) -> Self {
        self.log.details = Some(details.to_string());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.log.severity = severity;
        self
    }

    pub fn build(self) -> ActivityLog {
        self.log
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub severity: Option<Severity>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
