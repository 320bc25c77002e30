// ============================================================================
// BizHub Core - Complaint Entity
// File: crates/bizhub-core/src/domain/complaint.rs
// Description: Customer complaints, their status lifecycle, history and comments
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::Actor;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    New,
    Assigned,
    InProgress,
    Pending,
    Resolved,
    Closed,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 7] = [
        ComplaintStatus::New,
        ComplaintStatus::Assigned,
        ComplaintStatus::InProgress,
        ComplaintStatus::Pending,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
        ComplaintStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::New => "NEW",
            ComplaintStatus::Assigned => "ASSIGNED",
            ComplaintStatus::InProgress => "IN_PROGRESS",
            ComplaintStatus::Pending => "PENDING",
            ComplaintStatus::Resolved => "RESOLVED",
            ComplaintStatus::Closed => "CLOSED",
            ComplaintStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s.trim().to_uppercase())
    }

    pub fn allowed_transitions(&self) -> &'static [ComplaintStatus] {
        use ComplaintStatus::*;
        match self {
            New => &[Assigned, InProgress, Rejected, Closed],
            Assigned => &[New, InProgress, Pending, Resolved, Rejected],
            InProgress => &[Assigned, Pending, Resolved, Rejected],
            Pending => &[InProgress, Resolved, Rejected, Closed],
            Resolved => &[InProgress, Closed],
            Rejected => &[Closed],
            Closed => &[],
        }
    }

    pub fn can_transition_to(&self, to: ComplaintStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Resolved or closed, counted as handled in statistics.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Closed)
    }
}

impl Default for ComplaintStatus {
    fn default() -> Self {
        ComplaintStatus::New
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub priority: i16,
    pub service_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub financial_impact: Option<f64>,
    pub submitted_by_id: Uuid,
    pub assigned_agent_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComplaintInput {
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(range(min = 1, max = 5, message = "Priority must be between 1 and 5"))]
    pub priority: Option<i16>,

    pub service_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,

    #[validate(range(min = 0.0, message = "Financial impact cannot be negative"))]
    pub financial_impact: Option<f64>,
}

pub const DEFAULT_PRIORITY: i16 = 3;

impl Complaint {
    pub fn new(input: ComplaintInput, submitted_by: Uuid) -> Result<Self, DomainError> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: ComplaintStatus::New,
            priority: input.priority.unwrap_or(DEFAULT_PRIORITY),
            service_id: input.service_id,
            product_id: input.product_id,
            provider_id: input.provider_id,
            financial_impact: input.financial_impact,
            submitted_by_id: submitted_by,
            assigned_agent_id: None,
            assigned_at: None,
            resolved_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, input: ComplaintInput) -> Result<(), DomainError> {
        let input = input.normalized();
        input.validate()?;

        self.title = input.title;
        self.description = input.description;
        self.priority = input.priority.unwrap_or(self.priority);
        self.service_id = input.service_id;
        self.product_id = input.product_id;
        self.provider_id = input.provider_id;
        self.financial_impact = input.financial_impact;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves to `to` and stamps the lifecycle timestamps.
    pub fn change_status(&mut self, to: ComplaintStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::invalid_transition(self.status.as_str(), to.as_str()));
        }

        match to {
            ComplaintStatus::Resolved if self.resolved_at.is_none() => self.resolved_at = Some(now),
            ComplaintStatus::Closed if self.closed_at.is_none() => self.closed_at = Some(now),
            ComplaintStatus::Assigned if self.assigned_at.is_none() => self.assigned_at = Some(now),
            // reopened: resolution time is measured from the next resolve
            ComplaintStatus::InProgress if self.status == ComplaintStatus::Resolved => self.resolved_at = None,
            _ => {}
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Sets or clears the assigned agent. Returns `true` when the assignment changed.
    /// `assigned_at` keeps the first assignment across handovers and is cleared on unassign.
    pub fn assign(&mut self, agent_id: Option<Uuid>, now: DateTime<Utc>) -> bool {
        if self.assigned_agent_id == agent_id {
            return false;
        }
        self.assigned_agent_id = agent_id;
        match agent_id {
            Some(_) if self.assigned_at.is_none() => self.assigned_at = Some(now),
            Some(_) => {}
            None => self.assigned_at = None,
        }
        self.updated_at = now;
        true
    }

    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assigned_agent_id == Some(user_id)
    }

    /// Customers only see what they submitted; staff see everything.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.role.is_staff() || self.submitted_by_id == actor.user_id
    }

    pub fn can_be_edited_by(&self, actor: &Actor) -> bool {
        actor.role.is_staff() || self.submitted_by_id == actor.user_id || self.is_assigned_to(actor.user_id)
    }

    /// Days between submission and resolution, fractional.
    pub fn resolution_days(&self) -> Option<f64> {
        self.resolved_at
            .map(|resolved| (resolved - self.created_at).num_seconds() as f64 / 86_400.0)
    }
}

impl ComplaintInput {
    fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintStatusHistory {
    pub id: Uuid,
    pub complaint_id: Uuid,
    /// `None` for the creation entry
    pub previous_status: Option<ComplaintStatus>,
    pub new_status: ComplaintStatus,
    pub changed_by_id: Uuid,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl ComplaintStatusHistory {
    pub fn new(
        complaint: &Complaint,
        previous_status: Option<ComplaintStatus>,
        changed_by: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            complaint_id: complaint.id,
            previous_status,
            new_status: complaint.status,
            changed_by_id: changed_by,
            notes,
            changed_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintComment {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

impl ComplaintComment {
    pub fn new(complaint_id: Uuid, user_id: Uuid, text: &str, is_internal: bool) -> Result<Self, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::ValidationError("Comment text is required".to_string()));
        }
        if text.chars().count() > 5000 {
            return Err(DomainError::ValidationError("Comment is too long".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            complaint_id,
            user_id,
            text: text.to_string(),
            is_internal,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<i16>,
    pub provider_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub assigned_agent_id: Option<Uuid>,
    pub submitted_by_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn complaint_input() -> ComplaintInput {
        ComplaintInput {
            title: "Double charge on SMS".to_string(),
            description: "Subscriber was charged twice for a single premium SMS.".to_string(),
            priority: None,
            service_id: None,
            product_id: None,
            provider_id: Some(Uuid::new_v4()),
            financial_impact: Some(2.5),
        }
    }

    pub fn complaint_with_status(status: ComplaintStatus) -> Complaint {
        let mut complaint = Complaint::new(complaint_input(), Uuid::new_v4()).unwrap();
        complaint.status = status;
        complaint
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::role::UserRole;
    use chrono::Duration;
    use ComplaintStatus::*;

    #[test]
    fn test_create_defaults() {
        let complaint = Complaint::new(complaint_input(), Uuid::new_v4()).unwrap();
        assert_eq!(complaint.status, New);
        assert_eq!(complaint.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_create_validation() {
        let mut input = complaint_input();
        input.title = " Bad ".to_string();
        input.description = "short".to_string();
        input.priority = Some(9);

        let msg = Complaint::new(input, Uuid::new_v4()).unwrap_err().to_string();
        assert!(msg.contains("Title must be between 5 and 100"));
        assert!(msg.contains("Description must be at least 10"));
        assert!(msg.contains("Priority must be between 1 and 5"));
    }

    #[test]
    fn test_transition_table() {
        assert!(New.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));
        assert!(!New.can_transition_to(Resolved));
        assert!(!Rejected.can_transition_to(InProgress));
        assert!(Closed.allowed_transitions().is_empty());
        for status in ComplaintStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_status_timestamps() {
        let mut complaint = complaint_with_status(InProgress);
        let resolved_at = Utc::now();
        complaint.change_status(Resolved, resolved_at).unwrap();
        assert_eq!(complaint.resolved_at, Some(resolved_at));

        complaint.change_status(InProgress, resolved_at + Duration::hours(1)).unwrap();
        assert!(complaint.resolved_at.is_none());

        complaint.change_status(Resolved, resolved_at + Duration::hours(2)).unwrap();
        complaint.change_status(Closed, resolved_at + Duration::hours(3)).unwrap();
        assert_eq!(complaint.closed_at, Some(resolved_at + Duration::hours(3)));
    }

    #[test]
    fn test_invalid_change_keeps_state() {
        let mut complaint = complaint_with_status(Closed);
        assert!(complaint.change_status(InProgress, Utc::now()).is_err());
        assert_eq!(complaint.status, Closed);
    }

    #[test]
    fn test_assign_and_unassign() {
        let mut complaint = complaint_with_status(New);
        let agent = Uuid::new_v4();
        assert!(complaint.assign(Some(agent), Utc::now()));
        assert!(complaint.assigned_at.is_some());
        assert!(!complaint.assign(Some(agent), Utc::now()));
        assert!(complaint.assign(None, Utc::now()));
        assert!(complaint.assigned_at.is_none());
    }

    #[test]
    fn test_reassignment_keeps_first_assignment_time() {
        let mut complaint = complaint_with_status(New);
        let first = Utc::now();
        complaint.assign(Some(Uuid::new_v4()), first);

        let second_agent = Uuid::new_v4();
        assert!(complaint.assign(Some(second_agent), first + Duration::hours(5)));
        assert!(complaint.is_assigned_to(second_agent));
        assert_eq!(complaint.assigned_at, Some(first));
        assert_eq!(complaint.updated_at, first + Duration::hours(5));
    }

    #[test]
    fn test_moving_to_assigned_stamps_missing_assignment_time() {
        let mut complaint = complaint_with_status(New);
        assert!(complaint.assigned_at.is_none());
        let at = Utc::now();
        complaint.change_status(Assigned, at).unwrap();
        assert_eq!(complaint.assigned_at, Some(at));
    }

    #[test]
    fn test_visibility_and_edit_rights() {
        let complaint = complaint_with_status(New);
        let owner = Actor::new(complaint.submitted_by_id, UserRole::User);
        let stranger = Actor::new(Uuid::new_v4(), UserRole::User);
        let agent = Actor::new(Uuid::new_v4(), UserRole::Agent);

        assert!(complaint.is_visible_to(&owner));
        assert!(!complaint.is_visible_to(&stranger));
        assert!(complaint.is_visible_to(&agent));
        assert!(complaint.can_be_edited_by(&owner));
        assert!(!complaint.can_be_edited_by(&stranger));
    }

    #[test]
    fn test_resolution_days() {
        let mut complaint = complaint_with_status(InProgress);
        complaint.change_status(Resolved, complaint.created_at + Duration::hours(36)).unwrap();
        assert_eq!(complaint.resolution_days(), Some(1.5));
    }

    #[test]
    fn test_empty_comment_rejected() {
        assert!(ComplaintComment::new(Uuid::new_v4(), Uuid::new_v4(), "   ", false).is_err());
    }
}
