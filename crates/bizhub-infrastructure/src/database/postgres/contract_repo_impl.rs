// ============================================================================
// BizHub Infrastructure - PostgreSQL Contract Repository
// File: crates/bizhub-infrastructure/src/database/postgres/contract_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bizhub_core::domain::{
    Contract, ContractFilter, ContractServiceTerm, ContractStatus, ContractStatusChange, ContractStatusLog,
    ContractType, RenewalEffect,
};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::ContractRepository;
use bizhub_shared::utils::search_pattern;
use bizhub_shared::{Page, Pagination};

use super::renewal_repo_impl::{insert_renewal, stale_renewal, update_renewal};
use crate::database::error::{decode_column, map_db_error};

/// Contract columns plus the attached services aggregated as JSON
const CONTRACT_SELECT: &str = r#"
    SELECT c.id, c.name, c.contract_number, c.contract_type, c.status, c.start_date, c.end_date,
           c.revenue_percentage, c.description, c.provider_id, c.humanitarian_org_id,
           c.parking_service_id, c.is_revenue_sharing, c.operator_revenue,
           c.created_by_id, c.last_modified_by_id, c.created_at, c.updated_at,
           COALESCE(
               (SELECT json_agg(json_build_object('service_id', cs.service_id, 'specific_terms', cs.specific_terms)
                                ORDER BY cs.service_id)
                  FROM contract_services cs
                 WHERE cs.contract_id = c.id),
               '[]'::json
           ) AS services
      FROM contracts c"#;

/// Status moves only through `apply_status_change`.
const CONTRACT_UPDATE: &str = r#"
    UPDATE contracts
    SET name = $2, contract_number = $3, contract_type = $4, start_date = $5, end_date = $6,
        revenue_percentage = $7, description = $8, provider_id = $9, humanitarian_org_id = $10,
        parking_service_id = $11, is_revenue_sharing = $12, operator_revenue = $13,
        last_modified_by_id = $14, updated_at = $15
    WHERE id = $1"#;

/// Matches only while the row still holds the status the change was planned from.
const CONTRACT_STATUS_UPDATE: &str = r#"
    UPDATE contracts
    SET status = $2, start_date = $3, end_date = $4, revenue_percentage = $5,
        last_modified_by_id = $6, updated_at = $7
    WHERE id = $1 AND status = $8"#;

pub struct PgContractRepository {
    pool: PgPool,
}

impl PgContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    name: String,
    contract_number: String,
    contract_type: String,
    status: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    revenue_percentage: f64,
    description: Option<String>,
    provider_id: Option<Uuid>,
    humanitarian_org_id: Option<Uuid>,
    parking_service_id: Option<Uuid>,
    is_revenue_sharing: bool,
    operator_revenue: Option<f64>,
    created_by_id: Option<Uuid>,
    last_modified_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    services: Json<Vec<ContractServiceTerm>>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = DomainError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Contract {
            id: row.id,
            name: row.name,
            contract_number: row.contract_number,
            contract_type: decode_column("contracts.contract_type", &row.contract_type, ContractType::from_str)?,
            status: decode_column("contracts.status", &row.status, ContractStatus::from_str)?,
            start_date: row.start_date,
            end_date: row.end_date,
            revenue_percentage: row.revenue_percentage,
            description: row.description,
            provider_id: row.provider_id,
            humanitarian_org_id: row.humanitarian_org_id,
            parking_service_id: row.parking_service_id,
            is_revenue_sharing: row.is_revenue_sharing,
            operator_revenue: row.operator_revenue,
            services: row.services.0,
            created_by_id: row.created_by_id,
            last_modified_by_id: row.last_modified_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatusLogRow {
    id: Uuid,
    contract_id: Uuid,
    old_status: String,
    new_status: String,
    comments: Option<String>,
    changed_by_id: Option<Uuid>,
    changed_at: DateTime<Utc>,
}

impl TryFrom<StatusLogRow> for ContractStatusLog {
    type Error = DomainError;

    fn try_from(row: StatusLogRow) -> Result<Self, Self::Error> {
        Ok(ContractStatusLog {
            id: row.id,
            contract_id: row.contract_id,
            old_status: decode_column("contract_status_logs.old_status", &row.old_status, ContractStatus::from_str)?,
            new_status: decode_column("contract_status_logs.new_status", &row.new_status, ContractStatus::from_str)?,
            comments: row.comments,
            changed_by_id: row.changed_by_id,
            changed_at: row.changed_at,
        })
    }
}

fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DomainError>
where
    T: TryFrom<R, Error = DomainError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn stale_status(id: Uuid) -> DomainError {
    DomainError::Conflict(format!("Contract {} status was changed concurrently; reload and retry", id))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ContractFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND c.status = ").push_bind(status.as_str());
    }
    if let Some(contract_type) = filter.contract_type {
        qb.push(" AND c.contract_type = ").push_bind(contract_type.as_str());
    }
    if let Some(provider_id) = filter.provider_id {
        qb.push(" AND c.provider_id = ").push_bind(provider_id);
    }
    if let Some(org_id) = filter.humanitarian_org_id {
        qb.push(" AND c.humanitarian_org_id = ").push_bind(org_id);
    }
    if let Some(parking_id) = filter.parking_service_id {
        qb.push(" AND c.parking_service_id = ").push_bind(parking_id);
    }
    if let Some(pattern) = search_pattern(filter.search.as_deref()) {
        qb.push(" AND (c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.contract_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

async fn fetch_contract(conn: &mut PgConnection, id: Uuid) -> Result<Option<Contract>, DomainError> {
    let row: Option<ContractRow> = sqlx::query_as(&format!("{} WHERE c.id = $1", CONTRACT_SELECT))
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_db_error("loading contract", e))?;

    row.map(Contract::try_from).transpose()
}

/// Replaces the service rows of a contract with `services`.
async fn replace_services(
    conn: &mut PgConnection,
    contract_id: Uuid,
    services: &[ContractServiceTerm],
) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM contract_services WHERE contract_id = $1")
        .bind(contract_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_db_error("clearing contract services", e))?;

    if services.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO contract_services (contract_id, service_id, specific_terms) ");
    qb.push_values(services, |mut b, term| {
        b.push_bind(contract_id)
            .push_bind(term.service_id)
            .push_bind(term.specific_terms.clone());
    });
    qb.build()
        .execute(&mut *conn)
        .await
        .map_err(|e| map_db_error("attaching contract services", e))?;

    Ok(())
}

#[async_trait]
impl ContractRepository for PgContractRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_db_error("acquiring connection", e))?;
        fetch_contract(&mut conn, id).await
    }

    async fn find_by_number(&self, contract_number: &str) -> Result<Option<Contract>, DomainError> {
        let row: Option<ContractRow> =
            sqlx::query_as(&format!("{} WHERE LOWER(c.contract_number) = LOWER($1)", CONTRACT_SELECT))
                .bind(contract_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding contract by number", e))?;

        row.map(Contract::try_from).transpose()
    }

    async fn list(&self, filter: &ContractFilter, page: Pagination) -> Result<Page<Contract>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM contracts c");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting contracts", e))?;

        let mut query = QueryBuilder::new(CONTRACT_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY c.updated_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ContractRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing contracts", e))?;

        Ok(Page::new(decode_all(rows)?, total, page))
    }

    async fn find_all(&self) -> Result<Vec<Contract>, DomainError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!("{} ORDER BY c.created_at", CONTRACT_SELECT))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("loading contracts", e))?;

        decode_all(rows)
    }

    async fn find_expiring(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Contract>, DomainError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!(
            "{} WHERE c.status = $1 AND c.end_date BETWEEN $2 AND $3 ORDER BY c.end_date ASC",
            CONTRACT_SELECT
        ))
        .bind(ContractStatus::Active.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("finding expiring contracts", e))?;

        decode_all(rows)
    }

    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Contract>, DomainError> {
        let rows: Vec<ContractRow> = sqlx::query_as(&format!(
            "{} WHERE c.status = $1 AND c.end_date < $2 ORDER BY c.end_date ASC",
            CONTRACT_SELECT
        ))
        .bind(ContractStatus::Active.as_str())
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("finding overdue contracts", e))?;

        decode_all(rows)
    }

    async fn create(&self, contract: &Contract) -> Result<Contract, DomainError> {
        info!("Creating contract {} ({})", contract.contract_number, contract.id);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, name, contract_number, contract_type, status, start_date, end_date,
                revenue_percentage, description, provider_id, humanitarian_org_id, parking_service_id,
                is_revenue_sharing, operator_revenue, created_by_id, last_modified_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(contract.id)
        .bind(&contract.name)
        .bind(&contract.contract_number)
        .bind(contract.contract_type.as_str())
        .bind(contract.status.as_str())
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.revenue_percentage)
        .bind(&contract.description)
        .bind(contract.provider_id)
        .bind(contract.humanitarian_org_id)
        .bind(contract.parking_service_id)
        .bind(contract.is_revenue_sharing)
        .bind(contract.operator_revenue)
        .bind(contract.created_by_id)
        .bind(contract.last_modified_by_id)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("creating contract", e))?;

        replace_services(&mut tx, contract.id, &contract.services).await?;
        let created = fetch_contract(&mut tx, contract.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", contract.id))?;

        tx.commit().await.map_err(|e| map_db_error("committing contract", e))?;
        Ok(created)
    }

    async fn update(&self, contract: &Contract) -> Result<Contract, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting transaction", e))?;

        let result = sqlx::query(CONTRACT_UPDATE)
            .bind(contract.id)
            .bind(&contract.name)
            .bind(&contract.contract_number)
            .bind(contract.contract_type.as_str())
            .bind(contract.start_date)
            .bind(contract.end_date)
            .bind(contract.revenue_percentage)
            .bind(&contract.description)
            .bind(contract.provider_id)
            .bind(contract.humanitarian_org_id)
            .bind(contract.parking_service_id)
            .bind(contract.is_revenue_sharing)
            .bind(contract.operator_revenue)
            .bind(contract.last_modified_by_id)
            .bind(contract.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("updating contract", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Contract", contract.id));
        }

        replace_services(&mut tx, contract.id, &contract.services).await?;
        let updated = fetch_contract(&mut tx, contract.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", contract.id))?;

        tx.commit().await.map_err(|e| map_db_error("committing contract", e))?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting contract", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Contract", id));
        }
        Ok(())
    }

    async fn apply_status_change(&self, change: &ContractStatusChange) -> Result<Contract, DomainError> {
        let contract = &change.contract;
        debug!(
            "Applying status change {} -> {} on contract {}",
            change.log.old_status, change.log.new_status, contract.id
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("starting transaction", e))?;

        // 1. Contract row, guarded on the status the change was planned from
        let result = sqlx::query(CONTRACT_STATUS_UPDATE)
            .bind(contract.id)
            .bind(contract.status.as_str())
            .bind(contract.start_date)
            .bind(contract.end_date)
            .bind(contract.revenue_percentage)
            .bind(contract.last_modified_by_id)
            .bind(contract.updated_at)
            .bind(change.log.old_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("updating contract status", e))?;

        if result.rows_affected() == 0 {
            return match fetch_contract(&mut tx, contract.id).await? {
                None => Err(DomainError::not_found("Contract", contract.id)),
                Some(current) => {
                    warn!(
                        "Contract {} moved to {} before {} -> {} was applied",
                        contract.id, current.status, change.log.old_status, change.log.new_status
                    );
                    Err(stale_status(contract.id))
                }
            };
        }

        // 2. Status log
        let log = &change.log;
        sqlx::query(
            r#"
            INSERT INTO contract_status_logs (id, contract_id, old_status, new_status, comments, changed_by_id, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(log.id)
        .bind(log.contract_id)
        .bind(log.old_status.as_str())
        .bind(log.new_status.as_str())
        .bind(&log.comments)
        .bind(log.changed_by_id)
        .bind(log.changed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("writing contract status log", e))?;

        // 3. Renewal record
        match &change.renewal {
            RenewalEffect::None => {}
            RenewalEffect::Open(renewal) => {
                insert_renewal(&mut tx, renewal).await?;
            }
            RenewalEffect::Close(renewal) => {
                // close() leaves the stage untouched, so the stored row must still match it
                update_renewal(&mut tx, renewal, renewal.sub_status)
                    .await?
                    .ok_or_else(|| stale_renewal(renewal.id))?;
            }
        }

        let updated = fetch_contract(&mut tx, contract.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", contract.id))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("committing status change", e))?;
        Ok(updated)
    }

    async fn status_history(&self, contract_id: Uuid) -> Result<Vec<ContractStatusLog>, DomainError> {
        let rows: Vec<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT id, contract_id, old_status, new_status, comments, changed_by_id, changed_at
            FROM contract_status_logs
            WHERE contract_id = $1
            ORDER BY changed_at DESC
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("loading contract status history", e))?;

        decode_all(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_render_in_order() {
        let filter = ContractFilter {
            status: Some(ContractStatus::Active),
            contract_type: Some(ContractType::Humanitarian),
            humanitarian_org_id: Some(Uuid::nil()),
            search: Some("  HUM-2024 ".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM contracts c");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM contracts c WHERE TRUE AND c.status = $1 AND c.contract_type = $2 \
             AND c.humanitarian_org_id = $3 AND (c.name ILIKE $4 OR c.contract_number ILIKE $5)"
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM contracts c");
        push_filters(&mut qb, &ContractFilter::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM contracts c WHERE TRUE");
    }

    #[test]
    fn test_status_write_is_guarded_on_previous_status() {
        assert!(CONTRACT_STATUS_UPDATE.trim_end().ends_with("WHERE id = $1 AND status = $8"));
        assert!(matches!(stale_status(Uuid::nil()), DomainError::Conflict(_)));
    }

    #[test]
    fn test_plain_update_never_writes_status() {
        assert!(!CONTRACT_UPDATE.contains("status"));
        assert!(CONTRACT_UPDATE.contains("updated_at = $15"));
    }

    fn row(contract_type: &str, status: &str) -> ContractRow {
        let now = Utc::now();
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        ContractRow {
            id: Uuid::new_v4(),
            name: "SMS Gateway".into(),
            contract_number: "PRV-001".into(),
            contract_type: contract_type.into(),
            status: status.into(),
            start_date: day,
            end_date: day,
            revenue_percentage: 10.0,
            description: None,
            provider_id: None,
            humanitarian_org_id: None,
            parking_service_id: None,
            is_revenue_sharing: false,
            operator_revenue: None,
            created_by_id: None,
            last_modified_by_id: None,
            created_at: now,
            updated_at: now,
            services: Json(vec![]),
        }
    }

    #[test]
    fn test_row_decodes_known_enums() {
        let contract = Contract::try_from(row("PARKING", "RENEWAL_IN_PROGRESS")).unwrap();
        assert_eq!(contract.contract_type, ContractType::Parking);
        assert_eq!(contract.status, ContractStatus::RenewalInProgress);
    }

    #[test]
    fn test_unknown_stored_status_is_an_error() {
        let err = Contract::try_from(row("PROVIDER", "ARCHIVED")).unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));

        let err = Contract::try_from(row("LEASE", "ACTIVE")).unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
