use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use bizhub_core::domain::{UserFilter, UserRole};
use bizhub_core::services::{CreateUserInput, RoleStatistics, UserInfo};
use bizhub_shared::Page;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, PageParams};
use crate::response::Updated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct BulkRoleRequest {
    pub user_ids: Vec<Uuid>,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Page<UserInfo>> {
    ok(state.users.list(&actor, &filter, page.pagination()).await?)
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Created<UserInfo> {
    created(state.users.create(&actor, input).await?)
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<UserInfo> {
    ok(state.users.get(&actor, id).await?)
}

/// PUT /users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> ApiResult<UserInfo> {
    ok(state.users.update_role(&actor, id, req.role).await?)
}

/// POST /users/bulk-role
pub async fn bulk_update_roles(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiJson(req): ApiJson<BulkRoleRequest>,
) -> ApiResult<Updated> {
    let updated = state.users.bulk_update_roles(&actor, &req.user_ids, req.role).await?;
    ok(Updated { updated })
}

/// PUT /users/{id}/active
pub async fn set_active(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> ApiResult<UserInfo> {
    ok(state.users.set_active(&actor, id, req.is_active).await?)
}

pub async fn statistics(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<RoleStatistics> {
    ok(state.users.role_statistics(&actor).await?)
}
