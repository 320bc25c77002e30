// ============================================================================
// BizHub Core - Complaint Service
// File: crates/bizhub-core/src/services/complaint_service.rs
// ============================================================================
//! Complaint intake, assignment, status lifecycle and comments

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use bizhub_shared::{Page, Pagination};

use crate::domain::{
    ActivityAction, ActivityLog, Actor, Complaint, ComplaintComment, ComplaintFilter, ComplaintInput,
    ComplaintStatus, ComplaintStatusHistory, EntityKind, Severity, UserRole,
};
use crate::error::DomainError;
use crate::policy::{self, Action, Resource};
use crate::repositories::{ActivityRecorder, ComplaintRepository, UserRepository};

/// Status change request. `assigned_agent_id` distinguishes "not given"
/// (`None`) from an explicit `null` (`Some(None)`), which unassigns.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeComplaintStatus {
    pub status: ComplaintStatus,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub assigned_agent_id: Option<Option<Uuid>>,
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

impl ChangeComplaintStatus {
    pub fn to(status: ComplaintStatus) -> Self {
        Self {
            status,
            notes: None,
            assigned_agent_id: None,
        }
    }
}

pub struct ComplaintService {
    complaint_repo: Arc<dyn ComplaintRepository>,
    user_repo: Arc<dyn UserRepository>,
    activity: Arc<dyn ActivityRecorder>,
}

impl ComplaintService {
    pub fn new(
        complaint_repo: Arc<dyn ComplaintRepository>,
        user_repo: Arc<dyn UserRepository>,
        activity: Arc<dyn ActivityRecorder>,
    ) -> Self {
        Self {
            complaint_repo,
            user_repo,
            activity,
        }
    }

    pub async fn create(&self, actor: &Actor, input: ComplaintInput) -> Result<Complaint, DomainError> {
        policy::require(actor, Resource::Complaint, Action::Create)?;

        let complaint = Complaint::new(input, actor.user_id)?;
        let history = ComplaintStatusHistory::new(
            &complaint,
            None,
            actor.user_id,
            Some("Complaint created".to_string()),
            complaint.created_at,
        );
        let created = self.complaint_repo.create(&complaint, history).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ComplaintCreated, EntityKind::Complaint)
                .entity_id(created.id)
                .user(actor.user_id)
                .json(json!({ "title": created.title, "priority": created.priority }))
                .build(),
        );
        info!("Complaint created: {} by {}", created.id, actor.user_id);

        Ok(created)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Complaint, DomainError> {
        policy::require(actor, Resource::Complaint, Action::View)?;
        self.load_visible(actor, id).await
    }

    /// USER role callers only ever see their own complaints.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &ComplaintFilter,
        page: Pagination,
    ) -> Result<Page<Complaint>, DomainError> {
        policy::require(actor, Resource::Complaint, Action::View)?;

        let mut filter = filter.clone();
        if !actor.role.is_staff() {
            filter.submitted_by_id = Some(actor.user_id);
        }
        self.complaint_repo.list(&filter, page).await
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: ComplaintInput) -> Result<Complaint, DomainError> {
        let mut complaint = self.load_visible(actor, id).await?;
        if !complaint.can_be_edited_by(actor) {
            return Err(DomainError::forbidden("Not allowed to edit this complaint"));
        }

        complaint.apply_update(input)?;
        let updated = self.complaint_repo.update(&complaint, None).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ComplaintUpdated, EntityKind::Complaint)
                .entity_id(id)
                .user(actor.user_id)
                .build(),
        );
        info!("Complaint updated: {}", id);

        Ok(updated)
    }

    /// Moves the complaint through its lifecycle, optionally (re)assigning it.
    pub async fn change_status(
        &self,
        actor: &Actor,
        id: Uuid,
        request: ChangeComplaintStatus,
    ) -> Result<Complaint, DomainError> {
        policy::require(actor, Resource::Complaint, Action::Update)?;
        let mut complaint = self.load_visible(actor, id).await?;

        // 1. Agents work on their own complaints, or take ownership of one
        if actor.role == UserRole::Agent {
            if !complaint.is_assigned_to(actor.user_id) && request.status != ComplaintStatus::Assigned {
                return Err(DomainError::forbidden("Complaint is not assigned to you"));
            }
            if let Some(Some(agent)) = request.assigned_agent_id {
                if agent != actor.user_id {
                    return Err(DomainError::forbidden("Agents can only assign complaints to themselves"));
                }
            }
        }

        // 2. Resolve the target assignee
        let current_agent = complaint.assigned_agent_id;
        let target_agent = match request.assigned_agent_id {
            Some(explicit) => explicit,
            None if request.status == ComplaintStatus::Assigned && current_agent.is_none() => Some(actor.user_id),
            None => current_agent,
        };

        let status_changed = request.status != complaint.status;
        let agent_changed = target_agent != current_agent;
        if !status_changed && !agent_changed {
            return Ok(complaint);
        }
        if agent_changed {
            if let Some(agent) = target_agent.filter(|a| *a != actor.user_id) {
                self.ensure_assignable(agent).await?;
            }
        }

        // 3. Apply
        let now = Utc::now();
        let previous = complaint.status;
        if status_changed {
            complaint.change_status(request.status, now)?;
        }
        if agent_changed {
            complaint.assign(target_agent, now);
        }
        let history = status_changed.then(|| {
            ComplaintStatusHistory::new(&complaint, Some(previous), actor.user_id, request.notes.clone(), now)
        });
        let updated = self.complaint_repo.update(&complaint, history).await?;

        // 4. Audit
        let entry = if status_changed {
            let severity = if updated.status == ComplaintStatus::Rejected {
                Severity::Warning
            } else {
                Severity::Info
            };
            ActivityLog::builder(ActivityAction::ComplaintStatusChanged, EntityKind::Complaint)
                .severity(severity)
                .json(json!({
                    "from": previous.as_str(),
                    "to": updated.status.as_str(),
                    "assigned_agent_id": updated.assigned_agent_id,
                    "notes": request.notes,
                }))
        } else {
            ActivityLog::builder(ActivityAction::ComplaintAssigned, EntityKind::Complaint)
                .json(json!({ "from": current_agent, "to": updated.assigned_agent_id }))
        };
        self.activity.record(entry.entity_id(id).user(actor.user_id).build());
        info!("Complaint {} status {} -> {}", id, previous, updated.status);

        Ok(updated)
    }

    /// Manager assignment. A NEW complaint moves to ASSIGNED; `None` unassigns.
    pub async fn assign(&self, actor: &Actor, id: Uuid, agent_id: Option<Uuid>) -> Result<Complaint, DomainError> {
        policy::require_role(actor, &[UserRole::Admin, UserRole::Manager], "assign complaints")?;

        let mut complaint = self.load(id).await?;
        if complaint.assigned_agent_id == agent_id {
            return Ok(complaint);
        }
        if let Some(agent) = agent_id {
            self.ensure_assignable(agent).await?;
        }

        let now = Utc::now();
        let previous = complaint.status;
        complaint.assign(agent_id, now);

        let history = match agent_id {
            Some(_) if previous == ComplaintStatus::New => {
                complaint.change_status(ComplaintStatus::Assigned, now)?;
                Some(ComplaintStatusHistory::new(
                    &complaint,
                    Some(previous),
                    actor.user_id,
                    Some("Complaint assigned".to_string()),
                    now,
                ))
            }
            Some(_) => None,
            None => Some(ComplaintStatusHistory::new(
                &complaint,
                Some(previous),
                actor.user_id,
                Some("Complaint unassigned".to_string()),
                now,
            )),
        };
        let updated = self.complaint_repo.update(&complaint, history).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ComplaintAssigned, EntityKind::Complaint)
                .entity_id(id)
                .user(actor.user_id)
                .json(json!({ "assigned_agent_id": agent_id, "status": updated.status.as_str() }))
                .build(),
        );
        info!("Complaint {} assigned to {:?}", id, agent_id);

        Ok(updated)
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        id: Uuid,
        text: &str,
        is_internal: bool,
    ) -> Result<ComplaintComment, DomainError> {
        policy::require(actor, Resource::Complaint, Action::View)?;
        if is_internal && !actor.role.is_staff() {
            return Err(DomainError::forbidden("Only staff can add internal comments"));
        }

        self.load_visible(actor, id).await?;
        let comment = ComplaintComment::new(id, actor.user_id, text, is_internal)?;
        let created = self.complaint_repo.add_comment(&comment).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::CommentAdded, EntityKind::Complaint)
                .entity_id(id)
                .user(actor.user_id)
                .json(json!({ "comment_id": created.id, "is_internal": is_internal }))
                .build(),
        );

        Ok(created)
    }

    /// Internal comments are only returned to staff.
    pub async fn comments(&self, actor: &Actor, id: Uuid) -> Result<Vec<ComplaintComment>, DomainError> {
        policy::require(actor, Resource::Complaint, Action::View)?;
        self.load_visible(actor, id).await?;
        self.complaint_repo.comments(id, actor.role.is_staff()).await
    }

    pub async fn history(&self, actor: &Actor, id: Uuid) -> Result<Vec<ComplaintStatusHistory>, DomainError> {
        policy::require(actor, Resource::Complaint, Action::View)?;
        self.load_visible(actor, id).await?;
        self.complaint_repo.history(id).await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        policy::require(actor, Resource::Complaint, Action::Delete)?;

        let complaint = self.load(id).await?;
        self.complaint_repo.delete(id).await?;

        self.activity.record(
            ActivityLog::builder(ActivityAction::ComplaintDeleted, EntityKind::Complaint)
                .entity_id(id)
                .user(actor.user_id)
                .severity(Severity::Warning)
                .json(json!({ "title": complaint.title }))
                .build(),
        );
        warn!("Complaint {} deleted by {}", id, actor.user_id);
        Ok(())
    }

    async fn ensure_assignable(&self, agent_id: Uuid) -> Result<(), DomainError> {
        let agent = self
            .user_repo
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", agent_id))?;
        if !agent.is_active || !agent.role.is_staff() {
            return Err(DomainError::validation(vec![format!(
                "User {} cannot be assigned complaints",
                agent_id
            )]));
        }
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Complaint, DomainError> {
        self.complaint_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Complaint", id))
    }

    /// Complaints of other users are reported as missing to USER callers.
    async fn load_visible(&self, actor: &Actor, id: Uuid) -> Result<Complaint, DomainError> {
        let complaint = self.load(id).await?;
        if !complaint.is_visible_to(actor) {
            return Err(DomainError::not_found("Complaint", id));
        }
        Ok(complaint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complaint::fixtures::{complaint_input, complaint_with_status};
    use crate::domain::User;
    use crate::repositories::{MockActivityRecorder, MockComplaintRepository, MockUserRepository};
    use crate::services::test_support::{actor, expect_activity, no_activity};

    fn service(
        complaints: MockComplaintRepository,
        users: MockUserRepository,
        recorder: MockActivityRecorder,
    ) -> ComplaintService {
        ComplaintService::new(Arc::new(complaints), Arc::new(users), Arc::new(recorder))
    }

    fn returning(complaint: Complaint) -> MockComplaintRepository {
        let mut repo = MockComplaintRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(complaint.clone())));
        repo
    }

    fn staff_user(id: Uuid, role: UserRole, active: bool) -> User {
        let mut user = User::new("Agent Smith".into(), "smith@bizhub.example".into(), "hash".into(), role).unwrap();
        user.id = id;
        user.is_active = active;
        user
    }

    #[tokio::test]
    async fn test_create_writes_initial_history() {
        let mut repo = MockComplaintRepository::new();
        repo.expect_create()
            .withf(|c, h| c.status == ComplaintStatus::New && h.previous_status.is_none() && h.new_status == ComplaintStatus::New)
            .returning(|c, _| Ok(c.clone()));

        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_CREATED"));
        let user = actor(UserRole::User);
        let created = service.create(&user, complaint_input()).await.unwrap();
        assert_eq!(created.submitted_by_id, user.user_id);
    }

    #[tokio::test]
    async fn test_user_list_is_scoped_to_own_complaints() {
        let user = actor(UserRole::User);
        let user_id = user.user_id;
        let mut repo = MockComplaintRepository::new();
        repo.expect_list()
            .withf(move |f, _| f.submitted_by_id == Some(user_id))
            .returning(|_, p| Ok(Page::new(vec![], 0, p)));

        let service = service(repo, MockUserRepository::new(), no_activity());
        service
            .list(&user, &ComplaintFilter::default(), Pagination::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_user_cannot_see_foreign_complaint() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let id = complaint.id;
        let service = service(returning(complaint), MockUserRepository::new(), no_activity());
        assert!(matches!(
            service.get(&actor(UserRole::User), id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_submitter_can_update_own_complaint() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let submitter = Actor::new(complaint.submitted_by_id, UserRole::User);
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(|c, h| c.title == "Updated title" && h.is_none())
            .returning(|c, _| Ok(c.clone()));

        let mut input = complaint_input();
        input.title = "Updated title".into();
        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_UPDATED"));
        service.update(&submitter, id, input).await.unwrap();
    }

    #[tokio::test]
    async fn test_agent_takes_ownership_when_entering_assigned() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let id = complaint.id;
        let agent = actor(UserRole::Agent);
        let agent_id = agent.user_id;
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(move |c, h| {
                c.assigned_agent_id == Some(agent_id)
                    && c.assigned_at.is_some()
                    && h.as_ref().map(|h| h.previous_status) == Some(Some(ComplaintStatus::New))
            })
            .returning(|c, _| Ok(c.clone()));

        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_STATUS_CHANGED"));
        let updated = service
            .change_status(&agent, id, ChangeComplaintStatus::to(ComplaintStatus::Assigned))
            .await
            .unwrap();
        assert_eq!(updated.status, ComplaintStatus::Assigned);
    }

    #[tokio::test]
    async fn test_agent_cannot_work_unassigned_complaint() {
        let complaint = complaint_with_status(ComplaintStatus::Assigned);
        let id = complaint.id;
        let service = service(returning(complaint), MockUserRepository::new(), no_activity());
        let err = service
            .change_status(&actor(UserRole::Agent), id, ChangeComplaintStatus::to(ComplaintStatus::InProgress))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_no_op_when_nothing_changes() {
        let complaint = complaint_with_status(ComplaintStatus::Pending);
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update().never();

        let service = service(repo, MockUserRepository::new(), no_activity());
        let unchanged = service
            .change_status(&actor(UserRole::Manager), id, ChangeComplaintStatus::to(ComplaintStatus::Pending))
            .await
            .unwrap();
        assert_eq!(unchanged.status, ComplaintStatus::Pending);
    }

    #[tokio::test]
    async fn test_invalid_transition() {
        let complaint = complaint_with_status(ComplaintStatus::Closed);
        let id = complaint.id;
        let service = service(returning(complaint), MockUserRepository::new(), no_activity());
        let err = service
            .change_status(&actor(UserRole::Admin), id, ChangeComplaintStatus::to(ComplaintStatus::InProgress))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change status from CLOSED to IN PROGRESS");
    }

    #[tokio::test]
    async fn test_resolve_sets_resolved_at() {
        let mut complaint = complaint_with_status(ComplaintStatus::InProgress);
        let manager = actor(UserRole::Manager);
        complaint.assigned_agent_id = Some(Uuid::new_v4());
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(|c, h| c.resolved_at.is_some() && h.is_some())
            .returning(|c, _| Ok(c.clone()));

        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_STATUS_CHANGED"));
        service
            .change_status(&manager, id, ChangeComplaintStatus::to(ComplaintStatus::Resolved))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reject_is_recorded_as_warning() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update().returning(|c, _| Ok(c.clone()));
        let mut recorder = MockActivityRecorder::new();
        recorder
            .expect_record()
            .withf(|e| e.action == "COMPLAINT_STATUS_CHANGED" && e.severity == Severity::Warning)
            .times(1)
            .return_const(());

        let service = service(repo, MockUserRepository::new(), recorder);
        service
            .change_status(&actor(UserRole::Admin), id, ChangeComplaintStatus::to(ComplaintStatus::Rejected))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_explicit_null_unassigns() {
        let mut complaint = complaint_with_status(ComplaintStatus::Pending);
        complaint.assigned_agent_id = Some(Uuid::new_v4());
        complaint.assigned_at = Some(Utc::now());
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(|c, h| c.assigned_agent_id.is_none() && c.assigned_at.is_none() && h.is_none())
            .returning(|c, _| Ok(c.clone()));

        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_ASSIGNED"));
        let request: ChangeComplaintStatus =
            serde_json::from_value(json!({ "status": "PENDING", "assigned_agent_id": null })).unwrap();
        assert_eq!(request.assigned_agent_id, Some(None));
        service.change_status(&actor(UserRole::Manager), id, request).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_new_complaint_moves_to_assigned() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let id = complaint.id;
        let agent_id = Uuid::new_v4();
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(move |c, h| c.status == ComplaintStatus::Assigned && c.assigned_agent_id == Some(agent_id) && h.is_some())
            .returning(|c, _| Ok(c.clone()));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(staff_user(id, UserRole::Agent, true))));

        let service = service(repo, users, expect_activity("COMPLAINT_ASSIGNED"));
        service.assign(&actor(UserRole::Manager), id, Some(agent_id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_to_inactive_user_rejected() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update().never();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(staff_user(id, UserRole::Agent, false))));

        let service = service(repo, users, no_activity());
        assert!(matches!(
            service.assign(&actor(UserRole::Admin), id, Some(Uuid::new_v4())).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_unassign_keeps_status_with_history() {
        let mut complaint = complaint_with_status(ComplaintStatus::InProgress);
        complaint.assigned_agent_id = Some(Uuid::new_v4());
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_update()
            .withf(|c, h| {
                c.status == ComplaintStatus::InProgress
                    && h.as_ref().map(|h| (h.previous_status, h.new_status))
                        == Some((Some(ComplaintStatus::InProgress), ComplaintStatus::InProgress))
            })
            .returning(|c, _| Ok(c.clone()));

        let service = service(repo, MockUserRepository::new(), expect_activity("COMPLAINT_ASSIGNED"));
        service.assign(&actor(UserRole::Admin), id, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_cannot_add_internal_comment() {
        let service = service(MockComplaintRepository::new(), MockUserRepository::new(), no_activity());
        assert!(matches!(
            service.add_comment(&actor(UserRole::User), Uuid::new_v4(), "note", true).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_hide_internal_from_submitter() {
        let complaint = complaint_with_status(ComplaintStatus::New);
        let submitter = Actor::new(complaint.submitted_by_id, UserRole::User);
        let id = complaint.id;
        let mut repo = returning(complaint);
        repo.expect_comments()
            .withf(|_, include_internal| !include_internal)
            .returning(|_, _| Ok(vec![]));

        let service = service(repo, MockUserRepository::new(), no_activity());
        assert!(service.comments(&submitter, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_admin_deletes() {
        let service = service(MockComplaintRepository::new(), MockUserRepository::new(), no_activity());
        assert!(matches!(
            service.delete(&actor(UserRole::Manager), Uuid::new_v4()).await,
            Err(DomainError::Forbidden(_))
        ));
    }
}
