// ============================================================================
// BizHub Infrastructure - PostgreSQL Humanitarian Renewal Repository
// File: crates/bizhub-infrastructure/src/database/postgres/humanitarian_renewal_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use bizhub_core::domain::{
    HumanitarianRenewal, HumanitarianRenewalDetails, HumanitarianRenewalFilter, HumanitarianRenewalStatus,
};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::HumanitarianRenewalRepository;
use bizhub_shared::{Page, Pagination};

use crate::database::error::map_db_error;

const RENEWAL_COLUMNS: &str = r#"
    r.id, r.contract_id, r.humanitarian_org_id, r.proposed_start_date, r.proposed_end_date,
    r.proposed_revenue, r.sub_status, r.documents_received, r.legal_approved,
    r.financial_approved, r.signature_received, r.notes, r.created_by_id,
    r.last_modified_by_id, r.created_at, r.updated_at"#;

const DETAILS_FROM: &str = r#"
    FROM humanitarian_renewals r
    JOIN contracts c ON c.id = r.contract_id
    JOIN humanitarian_orgs o ON o.id = r.humanitarian_org_id"#;

pub struct PgHumanitarianRenewalRepository {
    pool: PgPool,
}

impl PgHumanitarianRenewalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn details_select() -> String {
        format!(
            "SELECT {}, c.contract_number, c.name AS contract_name, o.name AS organization_name {}",
            RENEWAL_COLUMNS, DETAILS_FROM
        )
    }
}

#[derive(Debug, FromRow)]
struct RenewalRow {
    id: Uuid,
    contract_id: Uuid,
    humanitarian_org_id: Uuid,
    proposed_start_date: NaiveDate,
    proposed_end_date: NaiveDate,
    proposed_revenue: Option<f64>,
    sub_status: String,
    documents_received: bool,
    legal_approved: bool,
    financial_approved: bool,
    signature_received: bool,
    notes: Option<String>,
    created_by_id: Uuid,
    last_modified_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RenewalRow> for HumanitarianRenewal {
    fn from(row: RenewalRow) -> Self {
        HumanitarianRenewal {
            id: row.id,
            contract_id: row.contract_id,
            humanitarian_org_id: row.humanitarian_org_id,
            proposed_start_date: row.proposed_start_date,
            proposed_end_date: row.proposed_end_date,
            proposed_revenue: row.proposed_revenue,
            sub_status: HumanitarianRenewalStatus::from_str(&row.sub_status).unwrap_or_default(),
            documents_received: row.documents_received,
            legal_approved: row.legal_approved,
            financial_approved: row.financial_approved,
            signature_received: row.signature_received,
            notes: row.notes,
            created_by_id: row.created_by_id,
            last_modified_by_id: row.last_modified_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DetailsRow {
    #[sqlx(flatten)]
    renewal: RenewalRow,
    contract_number: String,
    contract_name: String,
    organization_name: String,
}

impl From<DetailsRow> for HumanitarianRenewalDetails {
    fn from(row: DetailsRow) -> Self {
        let renewal: HumanitarianRenewal = row.renewal.into();
        HumanitarianRenewalDetails {
            progress_percentage: renewal.progress_percentage(),
            renewal,
            contract_number: row.contract_number,
            contract_name: row.contract_name,
            organization_name: row.organization_name,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &HumanitarianRenewalFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.sub_status {
        qb.push(" AND r.sub_status = ").push_bind(status.as_str());
    }
    if let Some(org_id) = filter.humanitarian_org_id {
        qb.push(" AND r.humanitarian_org_id = ").push_bind(org_id);
    }
    if let Some(contract_id) = filter.contract_id {
        qb.push(" AND r.contract_id = ").push_bind(contract_id);
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND r.proposed_start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND r.proposed_start_date <= ").push_bind(to);
    }
}

#[async_trait]
impl HumanitarianRenewalRepository for PgHumanitarianRenewalRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HumanitarianRenewalDetails>, DomainError> {
        let row: Option<DetailsRow> = sqlx::query_as(&format!("{} WHERE r.id = $1", Self::details_select()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("finding humanitarian renewal", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<HumanitarianRenewalDetails>, DomainError> {
        let rows: Vec<DetailsRow> = sqlx::query_as(&format!(
            "{} WHERE r.id = ANY($1) ORDER BY r.updated_at DESC",
            Self::details_select()
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("finding humanitarian renewals", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_open_for_contract(&self, contract_id: Uuid) -> Result<Option<HumanitarianRenewal>, DomainError> {
        let row: Option<RenewalRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM humanitarian_renewals r
            WHERE r.contract_id = $1 AND r.sub_status <> $2
            ORDER BY r.created_at DESC
            LIMIT 1
            "#,
            RENEWAL_COLUMNS
        ))
        .bind(contract_id)
        .bind(HumanitarianRenewalStatus::FinalProcessing.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding open humanitarian renewal", e))?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &HumanitarianRenewalFilter,
        page: Pagination,
    ) -> Result<Page<HumanitarianRenewalDetails>, DomainError> {
        let mut count = QueryBuilder::new(format!("SELECT COUNT(*) {}", DETAILS_FROM));
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting humanitarian renewals", e))?;

        let mut query = QueryBuilder::new(Self::details_select());
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY r.updated_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<DetailsRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing humanitarian renewals", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn find_all(&self) -> Result<Vec<HumanitarianRenewal>, DomainError> {
        let rows: Vec<RenewalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM humanitarian_renewals r ORDER BY r.created_at",
            RENEWAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading humanitarian renewals", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, renewal: &HumanitarianRenewal) -> Result<HumanitarianRenewal, DomainError> {
        info!("Creating humanitarian renewal {} for contract {}", renewal.id, renewal.contract_id);

        let row: RenewalRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO humanitarian_renewals AS r (
                id, contract_id, humanitarian_org_id, proposed_start_date, proposed_end_date,
                proposed_revenue, sub_status, documents_received, legal_approved, financial_approved,
                signature_received, notes, created_by_id, last_modified_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            RENEWAL_COLUMNS
        ))
        .bind(renewal.id)
        .bind(renewal.contract_id)
        .bind(renewal.humanitarian_org_id)
        .bind(renewal.proposed_start_date)
        .bind(renewal.proposed_end_date)
        .bind(renewal.proposed_revenue)
        .bind(renewal.sub_status.as_str())
        .bind(renewal.documents_received)
        .bind(renewal.legal_approved)
        .bind(renewal.financial_approved)
        .bind(renewal.signature_received)
        .bind(&renewal.notes)
        .bind(renewal.created_by_id)
        .bind(renewal.last_modified_by_id)
        .bind(renewal.created_at)
        .bind(renewal.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating humanitarian renewal", e))?;

        Ok(row.into())
    }

    async fn update(&self, renewal: &HumanitarianRenewal) -> Result<HumanitarianRenewal, DomainError> {
        let row: Option<RenewalRow> = sqlx::query_as(&format!(
            r#"
            UPDATE humanitarian_renewals AS r
            SET proposed_start_date = $2, proposed_end_date = $3, proposed_revenue = $4,
                sub_status = $5, documents_received = $6, legal_approved = $7,
                financial_approved = $8, signature_received = $9, notes = $10,
                last_modified_by_id = $11, updated_at = $12
            WHERE r.id = $1
            RETURNING {}
            "#,
            RENEWAL_COLUMNS
        ))
        .bind(renewal.id)
        .bind(renewal.proposed_start_date)
        .bind(renewal.proposed_end_date)
        .bind(renewal.proposed_revenue)
        .bind(renewal.sub_status.as_str())
        .bind(renewal.documents_received)
        .bind(renewal.legal_approved)
        .bind(renewal.financial_approved)
        .bind(renewal.signature_received)
        .bind(&renewal.notes)
        .bind(renewal.last_modified_by_id)
        .bind(renewal.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating humanitarian renewal", e))?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::not_found("Humanitarian renewal", renewal.id))
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM humanitarian_renewals WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting humanitarian renewals", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_filters_on_proposed_start() {
        let filter = HumanitarianRenewalFilter {
            sub_status: Some(HumanitarianRenewalStatus::LegalReview),
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 12, 31),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM humanitarian_renewals r");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM humanitarian_renewals r WHERE TRUE AND r.sub_status = $1 \
             AND r.proposed_start_date >= $2 AND r.proposed_start_date <= $3"
        );
    }
}
