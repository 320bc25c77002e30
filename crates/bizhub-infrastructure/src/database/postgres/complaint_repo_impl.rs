// ============================================================================
// BizHub Infrastructure - PostgreSQL Complaint Repository
// File: crates/bizhub-infrastructure/src/database/postgres/complaint_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use bizhub_core::domain::{Complaint, ComplaintComment, ComplaintFilter, ComplaintStatus, ComplaintStatusHistory};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ComplaintRepository;
use bizhub_shared::utils::search_pattern;
use bizhub_shared::{Page, Pagination};

use crate::database::error::map_db_error;

const COMPLAINT_COLUMNS: &str = r#"
    id, title, description, status, priority, service_id, product_id, provider_id,
    financial_impact, submitted_by_id, assigned_agent_id, assigned_at, resolved_at,
    closed_at, created_at, updated_at"#;

pub struct PgComplaintRepository {
    pool: PgPool,
}

impl PgComplaintRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ComplaintRow {
    id: Uuid,
    title: String,
    description: String,
    status: String,
    priority: i16,
    service_id: Option<Uuid>,
    product_id: Option<Uuid>,
    provider_id: Option<Uuid>,
    financial_impact: Option<f64>,
    submitted_by_id: Uuid,
    assigned_agent_id: Option<Uuid>,
    assigned_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ComplaintRow> for Complaint {
    fn from(row: ComplaintRow) -> Self {
        Complaint {
            id: row.id,
            title: row.title,
            description: row.description,
            status: ComplaintStatus::from_str(&row.status).unwrap_or_default(),
            priority: row.priority,
            service_id: row.service_id,
            product_id: row.product_id,
            provider_id: row.provider_id,
            financial_impact: row.financial_impact,
            submitted_by_id: row.submitted_by_id,
            assigned_agent_id: row.assigned_agent_id,
            assigned_at: row.assigned_at,
            resolved_at: row.resolved_at,
            closed_at: row.closed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    complaint_id: Uuid,
    previous_status: Option<String>,
    new_status: String,
    changed_by_id: Uuid,
    notes: Option<String>,
    changed_at: DateTime<Utc>,
}

impl From<HistoryRow> for ComplaintStatusHistory {
    fn from(row: HistoryRow) -> Self {
        ComplaintStatusHistory {
            id: row.id,
            complaint_id: row.complaint_id,
            previous_status: row.previous_status.as_deref().and_then(ComplaintStatus::from_str),
            new_status: ComplaintStatus::from_str(&row.new_status).unwrap_or_default(),
            changed_by_id: row.changed_by_id,
            notes: row.notes,
            changed_at: row.changed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    complaint_id: Uuid,
    user_id: Uuid,
    text: String,
    is_internal: bool,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for ComplaintComment {
    fn from(row: CommentRow) -> Self {
        ComplaintComment {
            id: row.id,
            complaint_id: row.complaint_id,
            user_id: row.user_id,
            text: row.text,
            is_internal: row.is_internal,
            created_at: row.created_at,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ComplaintFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(provider_id) = filter.provider_id {
        qb.push(" AND provider_id = ").push_bind(provider_id);
    }
    if let Some(service_id) = filter.service_id {
        qb.push(" AND service_id = ").push_bind(service_id);
    }
    if let Some(agent_id) = filter.assigned_agent_id {
        qb.push(" AND assigned_agent_id = ").push_bind(agent_id);
    }
    if let Some(user_id) = filter.submitted_by_id {
        qb.push(" AND submitted_by_id = ").push_bind(user_id);
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

async fn insert_history(conn: &mut PgConnection, history: &ComplaintStatusHistory) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO complaint_status_history (id, complaint_id, previous_status, new_status, changed_by_id, notes, changed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(history.id)
    .bind(history.complaint_id)
    .bind(history.previous_status.map(|s| s.as_str()))
    .bind(history.new_status.as_str())
    .bind(history.changed_by_id)
    .bind(&history.notes)
    .bind(history.changed_at)
    .execute(conn)
    .await
    .map_err(|e| map_db_error("writing complaint history", e))?;

    Ok(())
}

#[async_trait]
impl ComplaintRepository for PgComplaintRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, DomainError> {
        let row: Option<ComplaintRow> =
            sqlx::query_as(&format!("SELECT {} FROM complaints WHERE id = $1", COMPLAINT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding complaint", e))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &ComplaintFilter, page: Pagination) -> Result<Page<Complaint>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM complaints");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting complaints", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM complaints", COMPLAINT_COLUMNS));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ComplaintRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing complaints", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn find_matching(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, DomainError> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM complaints", COMPLAINT_COLUMNS));
        push_filters(&mut query, filter);
        query.push(" ORDER BY created_at");
        let rows: Vec<ComplaintRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("loading complaints", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, complaint: &Complaint, history: ComplaintStatusHistory) -> Result<Complaint, DomainError> {
        info!("Creating complaint {}", complaint.id);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting transaction", e))?;

        let row: ComplaintRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO complaints (
                id, title, description, status, priority, service_id, product_id, provider_id,
                financial_impact, submitted_by_id, assigned_agent_id, assigned_at, resolved_at,
                closed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        ))
        .bind(complaint.id)
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.status.as_str())
        .bind(complaint.priority)
        .bind(complaint.service_id)
        .bind(complaint.product_id)
        .bind(complaint.provider_id)
        .bind(complaint.financial_impact)
        .bind(complaint.submitted_by_id)
        .bind(complaint.assigned_agent_id)
        .bind(complaint.assigned_at)
        .bind(complaint.resolved_at)
        .bind(complaint.closed_at)
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error("creating complaint", e))?;

        insert_history(&mut tx, &history).await?;

        tx.commit().await.map_err(|e| map_db_error("committing complaint", e))?;
        Ok(row.into())
    }

    async fn update(
        &self,
        complaint: &Complaint,
        history: Option<ComplaintStatusHistory>,
    ) -> Result<Complaint, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting transaction", e))?;

        let row: Option<ComplaintRow> = sqlx::query_as(&format!(
            r#"
            UPDATE complaints
            SET title = $2, description = $3, status = $4, priority = $5, service_id = $6,
                product_id = $7, provider_id = $8, financial_impact = $9, assigned_agent_id = $10,
                assigned_at = $11, resolved_at = $12, closed_at = $13, updated_at = $14
            WHERE id = $1
            RETURNING {}
            "#,
            COMPLAINT_COLUMNS
        ))
        .bind(complaint.id)
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.status.as_str())
        .bind(complaint.priority)
        .bind(complaint.service_id)
        .bind(complaint.product_id)
        .bind(complaint.provider_id)
        .bind(complaint.financial_impact)
        .bind(complaint.assigned_agent_id)
        .bind(complaint.assigned_at)
        .bind(complaint.resolved_at)
        .bind(complaint.closed_at)
        .bind(complaint.updated_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_error("updating complaint", e))?;

        let row = row.ok_or_else(|| DomainError::not_found("Complaint", complaint.id))?;

        if let Some(history) = history {
            insert_history(&mut tx, &history).await?;
        }

        tx.commit().await.map_err(|e| map_db_error("committing complaint", e))?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM complaints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting complaint", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Complaint", id));
        }
        Ok(())
    }

    async fn add_comment(&self, comment: &ComplaintComment) -> Result<ComplaintComment, DomainError> {
        let row: CommentRow = sqlx::query_as(
            r#"
            INSERT INTO complaint_comments (id, complaint_id, user_id, text, is_internal, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, complaint_id, user_id, text, is_internal, created_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.complaint_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .bind(comment.is_internal)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("adding complaint comment", e))?;

        Ok(row.into())
    }

    async fn comments(&self, complaint_id: Uuid, include_internal: bool) -> Result<Vec<ComplaintComment>, DomainError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, complaint_id, user_id, text, is_internal, created_at
            FROM complaint_comments
            WHERE complaint_id = $1 AND ($2 OR NOT is_internal)
            ORDER BY created_at ASC
            "#,
        )
        .bind(complaint_id)
        .bind(include_internal)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading complaint comments", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn history(&self, complaint_id: Uuid) -> Result<Vec<ComplaintStatusHistory>, DomainError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, complaint_id, previous_status, new_status, changed_by_id, notes, changed_at
            FROM complaint_status_history
            WHERE complaint_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading complaint history", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
