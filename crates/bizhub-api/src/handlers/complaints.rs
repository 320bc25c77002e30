use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use bizhub_core::domain::{
    Complaint, ComplaintComment, ComplaintFilter, ComplaintInput, ComplaintStatusHistory,
};
use bizhub_core::services::ChangeComplaintStatus;
use bizhub_shared::Page;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, PageParams};
use crate::response::Deleted;
use crate::state::AppState;

/// `agent_id: null` unassigns
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
    #[serde(default)]
    pub is_internal: bool,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ComplaintFilter>,
) -> ApiResult<Page<Complaint>> {
    ok(state.complaints.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<ComplaintInput>,
) -> Created<Complaint> {
    created(state.complaints.create(&actor, input).await?)
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Complaint> {
    ok(state.complaints.get(&actor, id).await?)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ComplaintInput>,
) -> ApiResult<Complaint> {
    ok(state.complaints.update(&actor, id, input).await?)
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.complaints.delete(&actor, id).await?;
    ok(Deleted { deleted: 1 })
}

/// PUT /complaints/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ChangeComplaintStatus>,
) -> ApiResult<Complaint> {
    ok(state.complaints.change_status(&actor, id, req).await?)
}

/// PUT /complaints/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AssignRequest>,
) -> ApiResult<Complaint> {
    ok(state.complaints.assign(&actor, id, req.agent_id).await?)
}

pub async fn comments(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ComplaintComment>> {
    ok(state.complaints.comments(&actor, id).await?)
}

pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Created<ComplaintComment> {
    created(state.complaints.add_comment(&actor, id, &req.text, req.is_internal).await?)
}

pub async fn history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ComplaintStatusHistory>> {
    ok(state.complaints.history(&actor, id).await?)
}
