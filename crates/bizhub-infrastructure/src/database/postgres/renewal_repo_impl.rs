// ============================================================================
// BizHub Infrastructure - PostgreSQL Contract Renewal Repository
// File: crates/bizhub-infrastructure/src/database/postgres/renewal_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use bizhub_core::domain::{ContractRenewal, RenewalChecklist, RenewalSubStatus};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::RenewalRepository;

use crate::database::error::{decode_column, map_db_error};

const RENEWAL_COLUMNS: &str = r#"
    id, contract_id, sub_status, proposed_start_date, proposed_end_date, proposed_revenue,
    documents_received, legal_approved, technical_approved, financial_approved,
    management_approved, signature_received, comments, internal_notes, is_active,
    completed_at, created_by_id, last_modified_by_id, created_at, updated_at"#;

pub struct PgRenewalRepository {
    pool: PgPool,
}

impl PgRenewalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RenewalRow {
    id: Uuid,
    contract_id: Uuid,
    sub_status: String,
    proposed_start_date: NaiveDate,
    proposed_end_date: NaiveDate,
    proposed_revenue: f64,
    documents_received: bool,
    legal_approved: bool,
    technical_approved: bool,
    financial_approved: bool,
    management_approved: bool,
    signature_received: bool,
    comments: Option<String>,
    internal_notes: Option<String>,
    is_active: bool,
    completed_at: Option<DateTime<Utc>>,
    created_by_id: Option<Uuid>,
    last_modified_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RenewalRow> for ContractRenewal {
    type Error = DomainError;

    fn try_from(row: RenewalRow) -> Result<Self, Self::Error> {
        Ok(ContractRenewal {
            id: row.id,
            contract_id: row.contract_id,
            sub_status: decode_column("contract_renewals.sub_status", &row.sub_status, RenewalSubStatus::from_str)?,
            proposed_start_date: row.proposed_start_date,
            proposed_end_date: row.proposed_end_date,
            proposed_revenue: row.proposed_revenue,
            checklist: RenewalChecklist {
                documents_received: row.documents_received,
                legal_approved: row.legal_approved,
                technical_approved: row.technical_approved,
                financial_approved: row.financial_approved,
                management_approved: row.management_approved,
                signature_received: row.signature_received,
            },
            comments: row.comments,
            internal_notes: row.internal_notes,
            is_active: row.is_active,
            completed_at: row.completed_at,
            created_by_id: row.created_by_id,
            last_modified_by_id: row.last_modified_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Applies only to the active renewal still sitting in the expected stage.
fn renewal_update_sql() -> String {
    format!(
        r#"
        UPDATE contract_renewals
        SET sub_status = $2, proposed_start_date = $3, proposed_end_date = $4, proposed_revenue = $5,
            documents_received = $6, legal_approved = $7, technical_approved = $8,
            financial_approved = $9, management_approved = $10, signature_received = $11,
            comments = $12, internal_notes = $13, is_active = $14, completed_at = $15,
            last_modified_by_id = $16, updated_at = $17
        WHERE id = $1 AND is_active AND sub_status = $18
        RETURNING {}
        "#,
        RENEWAL_COLUMNS
    )
}

pub(crate) fn stale_renewal(id: Uuid) -> DomainError {
    DomainError::Conflict(format!("Renewal {} was changed concurrently; reload and retry", id))
}

/// Inserts a renewal on an open connection or transaction.
pub(crate) async fn insert_renewal(
    conn: &mut PgConnection,
    renewal: &ContractRenewal,
) -> Result<ContractRenewal, DomainError> {
    let checklist = &renewal.checklist;
    let row: RenewalRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO contract_renewals (
            id, contract_id, sub_status, proposed_start_date, proposed_end_date, proposed_revenue,
            documents_received, legal_approved, technical_approved, financial_approved,
            management_approved, signature_received, comments, internal_notes, is_active,
            completed_at, created_by_id, last_modified_by_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING {}
        "#,
        RENEWAL_COLUMNS
    ))
    .bind(renewal.id)
    .bind(renewal.contract_id)
    .bind(renewal.sub_status.as_str())
    .bind(renewal.proposed_start_date)
    .bind(renewal.proposed_end_date)
    .bind(renewal.proposed_revenue)
    .bind(checklist.documents_received)
    .bind(checklist.legal_approved)
    .bind(checklist.technical_approved)
    .bind(checklist.financial_approved)
    .bind(checklist.management_approved)
    .bind(checklist.signature_received)
    .bind(&renewal.comments)
    .bind(&renewal.internal_notes)
    .bind(renewal.is_active)
    .bind(renewal.completed_at)
    .bind(renewal.created_by_id)
    .bind(renewal.last_modified_by_id)
    .bind(renewal.created_at)
    .bind(renewal.updated_at)
    .fetch_one(conn)
    .await
    .map_err(|e| map_db_error("opening renewal", e))?;

    row.try_into()
}

/// Writes every mutable renewal column. `None` when no active row with id
/// and `expected` stage exists.
pub(crate) async fn update_renewal(
    conn: &mut PgConnection,
    renewal: &ContractRenewal,
    expected: RenewalSubStatus,
) -> Result<Option<ContractRenewal>, DomainError> {
    let checklist = &renewal.checklist;
    let row: Option<RenewalRow> = sqlx::query_as(&renewal_update_sql())
    .bind(renewal.id)
    .bind(renewal.sub_status.as_str())
    .bind(renewal.proposed_start_date)
    .bind(renewal.proposed_end_date)
    .bind(renewal.proposed_revenue)
    .bind(checklist.documents_received)
    .bind(checklist.legal_approved)
    .bind(checklist.technical_approved)
    .bind(checklist.financial_approved)
    .bind(checklist.management_approved)
    .bind(checklist.signature_received)
    .bind(&renewal.comments)
    .bind(&renewal.internal_notes)
    .bind(renewal.is_active)
    .bind(renewal.completed_at)
    .bind(renewal.last_modified_by_id)
    .bind(renewal.updated_at)
    .bind(expected.as_str())
    .fetch_optional(conn)
    .await
    .map_err(|e| map_db_error("updating renewal", e))?;

    row.map(ContractRenewal::try_from).transpose()
}

#[async_trait]
impl RenewalRepository for PgRenewalRepository {
    async fn find_active(&self, contract_id: Uuid) -> Result<Option<ContractRenewal>, DomainError> {
        let row: Option<RenewalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contract_renewals WHERE contract_id = $1 AND is_active",
            RENEWAL_COLUMNS
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding active renewal", e))?;

        row.map(ContractRenewal::try_from).transpose()
    }

    async fn find_by_contract(&self, contract_id: Uuid) -> Result<Vec<ContractRenewal>, DomainError> {
        let rows: Vec<RenewalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contract_renewals WHERE contract_id = $1 ORDER BY created_at DESC",
            RENEWAL_COLUMNS
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading renewal history", e))?;

        rows.into_iter().map(ContractRenewal::try_from).collect()
    }

    async fn update(
        &self,
        renewal: &ContractRenewal,
        expected: RenewalSubStatus,
    ) -> Result<ContractRenewal, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_db_error("acquiring connection", e))?;

        if let Some(updated) = update_renewal(&mut conn, renewal, expected).await? {
            return Ok(updated);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM contract_renewals WHERE id = $1)")
            .bind(renewal.id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_db_error("checking renewal", e))?;

        if exists {
            Err(stale_renewal(renewal.id))
        } else {
            Err(DomainError::not_found("Renewal", renewal.id))
        }
    }
}
