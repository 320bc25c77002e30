// ============================================================================
// BizHub Infrastructure - PostgreSQL Humanitarian Organization Repository
// File: crates/bizhub-infrastructure/src/database/postgres/humanitarian_org_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use bizhub_core::domain::{DirectoryFilter, HumanitarianOrg};
use bizhub_core::error::DomainError;
use bizhub_core::repositories::HumanitarianOrgRepository;
use bizhub_shared::{Page, Pagination};

use super::directory_filter::push_directory_filters;
use crate::database::error::map_db_error;

const ORG_COLUMNS: &str = r#"
    id, name, contact_name, email, phone, address, website, mission, pib,
    registration_number, bank, account_number, short_number, is_active, created_at, updated_at"#;

pub struct PgHumanitarianOrgRepository {
    pool: PgPool,
}

impl PgHumanitarianOrgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, clause: &str, value: &str, context: &str) -> Result<Option<HumanitarianOrg>, DomainError> {
        let row: Option<OrgRow> = sqlx::query_as(&format!("SELECT {} FROM humanitarian_orgs WHERE {}", ORG_COLUMNS, clause))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(context, e))?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, FromRow)]
struct OrgRow {
    id: Uuid,
    name: String,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    website: Option<String>,
    mission: Option<String>,
    pib: Option<String>,
    registration_number: Option<String>,
    bank: Option<String>,
    account_number: Option<String>,
    short_number: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrgRow> for HumanitarianOrg {
    fn from(row: OrgRow) -> Self {
        HumanitarianOrg {
            id: row.id,
            name: row.name,
            contact_name: row.contact_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            website: row.website,
            mission: row.mission,
            pib: row.pib,
            registration_number: row.registration_number,
            bank: row.bank,
            account_number: row.account_number,
            short_number: row.short_number,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl HumanitarianOrgRepository for PgHumanitarianOrgRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<HumanitarianOrg>, DomainError> {
        let row: Option<OrgRow> = sqlx::query_as(&format!("SELECT {} FROM humanitarian_orgs WHERE id = $1", ORG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error("finding humanitarian organization", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<HumanitarianOrg>, DomainError> {
        self.find_one("LOWER(name) = LOWER($1)", name, "finding humanitarian organization by name")
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<HumanitarianOrg>, DomainError> {
        self.find_one("LOWER(email) = LOWER($1)", email, "finding humanitarian organization by email")
            .await
    }

    async fn list(&self, filter: &DirectoryFilter, page: Pagination) -> Result<Page<HumanitarianOrg>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM humanitarian_orgs");
        push_directory_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting humanitarian organizations", e))?;

        let mut query = QueryBuilder::new(format!("SELECT {} FROM humanitarian_orgs", ORG_COLUMNS));
        push_directory_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<OrgRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing humanitarian organizations", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), total, page))
    }

    async fn create(&self, org: &HumanitarianOrg) -> Result<HumanitarianOrg, DomainError> {
        let row: OrgRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO humanitarian_orgs (
                id, name, contact_name, email, phone, address, website, mission, pib,
                registration_number, bank, account_number, short_number, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            ORG_COLUMNS
        ))
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.contact_name)
        .bind(&org.email)
        .bind(&org.phone)
        .bind(&org.address)
        .bind(&org.website)
        .bind(&org.mission)
        .bind(&org.pib)
        .bind(&org.registration_number)
        .bind(&org.bank)
        .bind(&org.account_number)
        .bind(&org.short_number)
        .bind(org.is_active)
        .bind(org.created_at)
        .bind(org.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("creating humanitarian organization", e))?;

        Ok(row.into())
    }

    async fn update(&self, org: &HumanitarianOrg) -> Result<HumanitarianOrg, DomainError> {
        let row: Option<OrgRow> = sqlx::query_as(&format!(
            r#"
            UPDATE humanitarian_orgs
            SET name = $2, contact_name = $3, email = $4, phone = $5, address = $6, website = $7,
                mission = $8, pib = $9, registration_number = $10, bank = $11, account_number = $12,
                short_number = $13, is_active = $14, updated_at = $15
            WHERE id = $1
            RETURNING {}
            "#,
            ORG_COLUMNS
        ))
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.contact_name)
        .bind(&org.email)
        .bind(&org.phone)
        .bind(&org.address)
        .bind(&org.website)
        .bind(&org.mission)
        .bind(&org.pib)
        .bind(&org.registration_number)
        .bind(&org.bank)
        .bind(&org.account_number)
        .bind(&org.short_number)
        .bind(org.is_active)
        .bind(org.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("updating humanitarian organization", e))?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::not_found("Humanitarian organization", org.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM humanitarian_orgs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error("deleting humanitarian organization", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Humanitarian organization", id));
        }
        Ok(())
    }
}
