use axum::extract::State;
use serde::Deserialize;

use bizhub_core::services::{LoginResult, UserInfo};

use super::{ok, ApiResult};
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login
pub async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult<LoginResult> {
    ok(state.auth.login(&req.email, &req.password).await?)
}

/// GET /auth/me
pub async fn me(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<UserInfo> {
    ok(state.auth.current_user(&actor).await?)
}
