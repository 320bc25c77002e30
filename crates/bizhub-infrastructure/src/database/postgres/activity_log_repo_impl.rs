// ============================================================================
// BizHub Infrastructure - PostgreSQL Activity Log Repository
// File: crates/bizhub-infrastructure/src/database/postgres/activity_log_repo_impl.rs
// Description: Read side of the audit trail; writes go through ActivityLogger
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use bizhub_core::domain::{ActivityFilter, ActivityLog, Severity};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ActivityLogRepository;
use bizhub_shared::{Page, Pagination};

use crate::database::error::map_db_error;

const ACTIVITY_COLUMNS: &str = "id, action, entity_type, entity_id, details, severity, user_id, created_at";

pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    details: Option<String>,
    severity: String,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityLog {
    fn from(row: ActivityRow) -> Self {
        ActivityLog {
            id: row.id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details,
            severity: Severity::from_str(&row.severity).unwrap_or_default(),
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ActivityFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(action) = filter.action.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        qb.push(" AND action = ").push_bind(action.to_uppercase());
    }
    if let Some(entity_type) = filter.entity_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        qb.push(" AND entity_type = ").push_bind(entity_type.to_lowercase());
    }
    if let Some(entity_id) = filter.entity_id.clone() {
        qb.push(" AND entity_id = ").push_bind(entity_id);
    }
    if let Some(severity) = filter.severity {
        qb.push(" AND severity = ").push_bind(severity.as_str());
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn search(&self, filter: &ActivityFilter, page: Pagination) -> Result<Page<ActivityLog>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM activity_logs");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting activity logs", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM activity_logs", ACTIVITY_COLUMNS));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ActivityRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("searching activity logs", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }
}
