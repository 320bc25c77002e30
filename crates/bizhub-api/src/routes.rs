// ============================================================================
// BizHub API - Router
// File: crates/bizhub-api/src/routes.rs
// ============================================================================
//! Route table. Every `/api/v1` handler except login authenticates through
//! the `AuthUser` extractor.

use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers::{
    activity_logs, analytics, auth, complaints, contracts, directory, health, humanitarian_renewals, users,
};
use crate::state::AppState;

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/statistics", get(users::statistics))
        .route("/users/bulk-role", post(users::bulk_update_roles))
        .route("/users/{id}", get(users::get))
        .route("/users/{id}/role", put(users::update_role))
        .route("/users/{id}/active", put(users::set_active))
        // Directory
        .route("/providers", get(directory::list_provider).post(directory::create_provider))
        .route(
            "/providers/{id}",
            get(directory::get_provider)
                .put(directory::update_provider)
                .delete(directory::delete_provider),
        )
        .route(
            "/humanitarian-orgs",
            get(directory::list_humanitarian_org).post(directory::create_humanitarian_org),
        )
        .route(
            "/humanitarian-orgs/{id}",
            get(directory::get_humanitarian_org)
                .put(directory::update_humanitarian_org)
                .delete(directory::delete_humanitarian_org),
        )
        .route(
            "/parking-services",
            get(directory::list_parking_service).post(directory::create_parking_service),
        )
        .route(
            "/parking-services/{id}",
            get(directory::get_parking_service)
                .put(directory::update_parking_service)
                .delete(directory::delete_parking_service),
        )
        .route("/services", get(directory::list_service).post(directory::create_service))
        .route(
            "/services/{id}",
            get(directory::get_service)
                .put(directory::update_service)
                .delete(directory::delete_service),
        )
        // Contracts
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route("/contracts/expiring", get(contracts::expiring))
        .route(
            "/contracts/{id}",
            get(contracts::get).put(contracts::update).delete(contracts::delete),
        )
        .route("/contracts/{id}/status", put(contracts::change_status))
        .route("/contracts/{id}/status-history", get(contracts::status_history))
        .route(
            "/contracts/{id}/renewal",
            get(contracts::active_renewal).post(contracts::start_renewal),
        )
        .route("/contracts/{id}/renewal/sub-status", put(contracts::update_renewal_sub_status))
        .route("/contracts/{id}/renewal/complete", post(contracts::complete_renewal))
        .route("/contracts/{id}/renewals", get(contracts::renewal_history))
        // Humanitarian renewals
        .route(
            "/humanitarian-renewals",
            get(humanitarian_renewals::list).post(humanitarian_renewals::create),
        )
        .route("/humanitarian-renewals/statistics", get(humanitarian_renewals::statistics))
        .route("/humanitarian-renewals/bulk-delete", post(humanitarian_renewals::bulk_delete))
        .route(
            "/humanitarian-renewals/{id}",
            get(humanitarian_renewals::get)
                .put(humanitarian_renewals::update)
                .delete(humanitarian_renewals::delete),
        )
        // Complaints
        .route("/complaints", get(complaints::list).post(complaints::create))
        .route(
            "/complaints/{id}",
            get(complaints::get).put(complaints::update).delete(complaints::delete),
        )
        .route("/complaints/{id}/status", put(complaints::change_status))
        .route("/complaints/{id}/assign", put(complaints::assign))
        .route(
            "/complaints/{id}/comments",
            get(complaints::comments).post(complaints::add_comment),
        )
        .route("/complaints/{id}/history", get(complaints::history))
        // Analytics and audit
        .route("/analytics/complaints", get(analytics::complaints))
        .route("/analytics/contracts", get(analytics::contracts))
        .route("/activity-logs", get(activity_logs::search))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use bizhub_core::domain::{User, UserRole};
    use bizhub_core::repositories::{
        MockActivityLogRepository, MockActivityRecorder, MockComplaintRepository, MockContractRepository,
        MockHumanitarianOrgRepository, MockHumanitarianRenewalRepository, MockParkingServiceRepository,
        MockProviderRepository, MockRenewalRepository, MockServiceOfferingRepository, MockUserRepository,
    };
    use bizhub_core::services::{
        ActivityService, AuthService, CatalogService, ComplaintService, ContractService, HumanitarianOrgService,
        HumanitarianRenewalService, ParkingDirectoryService, ProviderService, RenewalService, StatisticsService,
        UserService,
    };
    use bizhub_security::{JwtService, LoginRateLimiter, PasswordService};
    use bizhub_shared::{Page, Pagination};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "router-test-secret";
    const PASSWORD: &str = "Corr3ct-Horse-Battery!";

    fn jwt() -> JwtService {
        JwtService::new(SECRET.to_string(), 900)
    }

    fn app(users: MockUserRepository, activity_logs: MockActivityLogRepository) -> Router {
        let mut recorder = MockActivityRecorder::new();
        recorder.expect_record().returning(|_| ());
        let recorder: Arc<MockActivityRecorder> = Arc::new(recorder);

        let users = Arc::new(users);
        let contracts = Arc::new(MockContractRepository::new());
        let renewals = Arc::new(MockRenewalRepository::new());
        let complaints = Arc::new(MockComplaintRepository::new());

        let state = AppState {
            db: PgPoolOptions::new()
                .connect_lazy("postgres://localhost/bizhub_test")
                .unwrap(),
            auth: Arc::new(AuthService::new(
                users.clone(),
                recorder.clone(),
                jwt(),
                Arc::new(LoginRateLimiter::new(10)),
            )),
            users: Arc::new(UserService::new(users.clone(), recorder.clone())),
            contracts: Arc::new(ContractService::new(contracts.clone(), renewals.clone(), recorder.clone())),
            renewals: Arc::new(RenewalService::new(contracts.clone(), renewals, recorder.clone())),
            humanitarian_renewals: Arc::new(HumanitarianRenewalService::new(
                Arc::new(MockHumanitarianRenewalRepository::new()),
                contracts.clone(),
                recorder.clone(),
            )),
            complaints: Arc::new(ComplaintService::new(complaints.clone(), users, recorder.clone())),
            providers: Arc::new(ProviderService::new(Arc::new(MockProviderRepository::new()), recorder.clone())),
            humanitarian_orgs: Arc::new(HumanitarianOrgService::new(
                Arc::new(MockHumanitarianOrgRepository::new()),
                recorder.clone(),
            )),
            parking_services: Arc::new(ParkingDirectoryService::new(
                Arc::new(MockParkingServiceRepository::new()),
                recorder.clone(),
            )),
            catalog: Arc::new(CatalogService::new(Arc::new(MockServiceOfferingRepository::new()), recorder)),
            activity: Arc::new(ActivityService::new(Arc::new(activity_logs))),
            statistics: Arc::new(StatisticsService::new(complaints, contracts)),
            expiring_soon_days: 30,
        };

        build_router(state, Duration::from_secs(5))
    }

    /// A stored account with `role` plus a bearer token issued to it.
    fn signed_in(role: UserRole, active: bool) -> (MockUserRepository, String) {
        let mut user = User::new("Rui Staff".into(), "rui@bizhub.test".into(), "$argon2id$stub".into(), role).unwrap();
        user.is_active = active;
        let token = jwt().generate_access_token(&user.id, role.as_str()).unwrap();

        let mut users = MockUserRepository::new();
        let user_id = user.id;
        users
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .returning(move |_| Ok(Some(user.clone())));
        (users, format!("Bearer {}", token))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app(MockUserRepository::new(), MockActivityLogRepository::new());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_with_envelope() {
        let app = app(MockUserRepository::new(), MockActivityLogRepository::new());

        let response = app
            .oneshot(Request::get("/api/v1/contracts").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let app = app(MockUserRepository::new(), MockActivityLogRepository::new());

        let response = app
            .oneshot(
                Request::get("/api/v1/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let hash = PasswordService::hash(PASSWORD).unwrap();
        let user = User::new("Ana Admin".into(), "ana@bizhub.test".into(), hash, UserRole::Admin).unwrap();

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_email()
            .withf(|email| email == "ana@bizhub.test")
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_update().returning(|u| Ok(u.clone()));

        let app = app(users, MockActivityLogRepository::new());
        let payload = serde_json::json!({ "email": "Ana@BizHub.test", "password": PASSWORD });

        let response = app
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["token_type"], "Bearer");
        assert!(!body["data"]["access_token"].as_str().unwrap().is_empty());
        assert!(body["data"]["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_malformed_login_body_is_bad_request() {
        let app = app(MockUserRepository::new(), MockActivityLogRepository::new());

        let response = app
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"email\": 42}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_deactivated_user_token_is_unauthorized() {
        let (users, token) = signed_in(UserRole::Manager, false);
        let app = app(users, MockActivityLogRepository::new());

        let response = app
            .oneshot(
                Request::get("/api/v1/auth/me")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_activity_logs_forbidden_for_user_role() {
        let (users, token) = signed_in(UserRole::User, true);
        let app = app(users, MockActivityLogRepository::new());

        let response = app
            .oneshot(
                Request::get("/api/v1/activity-logs")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_admin_searches_activity_logs_with_paging() {
        let mut logs = MockActivityLogRepository::new();
        logs.expect_search()
            .withf(|filter, page| filter.action.as_deref() == Some("login") && page.page == 2 && page.per_page == 5)
            .returning(|_, page| Ok(Page::new(Vec::new(), 7, page)));

        let (users, token) = signed_in(UserRole::Admin, true);
        let app = app(users, logs);

        let response = app
            .oneshot(
                Request::get("/api/v1/activity-logs?action=login&page=2&per_page=5")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["total"], 7);
        assert_eq!(body["data"]["page"], 2);
        assert_eq!(body["data"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn test_bad_path_id_is_bad_request() {
        let (users, token) = signed_in(UserRole::Manager, true);
        let app = app(users, MockActivityLogRepository::new());

        let response = app
            .oneshot(
                Request::get("/api/v1/contracts/not-a-uuid")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_default_pagination_shape() {
        let page: Page<()> = Page::new(Vec::new(), 0, Pagination::default());
        assert_eq!(page.per_page, 20);
    }
}
