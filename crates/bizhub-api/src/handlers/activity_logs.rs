use axum::extract::State;

use bizhub_core::domain::{ActivityFilter, ActivityLog};
use bizhub_shared::Page;

use super::{ok, ApiResult};
use crate::extractors::{ApiQuery, AuthUser, PageParams};
use crate::state::AppState;

/// GET /activity-logs (admin only)
pub async fn search(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ActivityFilter>,
) -> ApiResult<Page<ActivityLog>> {
    ok(state.activity.search(&actor, &filter, page.pagination()).await?)
}
