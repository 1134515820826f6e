//! PostgreSQL certificate backend.
//!
//! All functions operate on the `certificates` table created by the
//! embedded migrations in `migrations/`. Filters and orderings are rendered
//! with `sqlx::QueryBuilder` so every user-supplied value is a bind
//! parameter.
//!
//! Updates are one `UPDATE ... RETURNING` statement: the patch is merged
//! with `COALESCE` and revocation is `is_revoked = is_revoked OR $n`, so the
//! database applies it atomically and can never clear the flag.
//!
//! Name ordering uses `COLLATE "C"` to match byte-wise string ordering in
//! the other backends.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};

use super::{CertificateBackend, Filter, Order};
use crate::certificate::{normalize_email, Certificate, CertificateId, CertificatePatch};
use crate::error::BackendError;

const COLUMNS: &str = "id, recipient_name, email, course_name, issue_date, \
     instructor_name, organization, created_at, updated_at, is_revoked";

/// Certificate storage in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Connect to `url` and apply pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing, already-migrated pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {}
        Filter::IdEq(id) => {
            qb.push(" WHERE id = ");
            qb.push_bind(id.as_str().to_owned());
        }
        Filter::EmailEq(email) => {
            qb.push(" WHERE email = ");
            qb.push_bind(email.clone());
        }
        Filter::NamePrefix(prefix) => {
            qb.push(" WHERE starts_with(recipient_name, ");
            qb.push_bind(prefix.clone());
            qb.push(")");
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'static, Postgres>, order: Order) {
    match order {
        Order::Unordered => {}
        Order::CreatedAtDesc => {
            qb.push(r#" ORDER BY created_at DESC, id COLLATE "C" ASC"#);
        }
        Order::RecipientNameAsc => {
            qb.push(
                r#" ORDER BY recipient_name COLLATE "C" ASC, created_at ASC, id COLLATE "C" ASC"#,
            );
        }
    }
}

fn select_query(filter: &Filter, order: Order) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM certificates"));
    push_filter(&mut qb, filter);
    push_order(&mut qb, order);
    qb
}

fn update_query(
    filter: &Filter,
    patch: &CertificatePatch,
    at: DateTime<Utc>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE certificates SET recipient_name = COALESCE(");
    qb.push_bind(patch.recipient_name.clone());
    qb.push(", recipient_name), email = COALESCE(");
    qb.push_bind(patch.email.as_deref().map(normalize_email));
    qb.push(", email), course_name = COALESCE(");
    qb.push_bind(patch.course_name.clone());
    qb.push(", course_name), issue_date = COALESCE(");
    qb.push_bind(patch.issue_date);
    qb.push(", issue_date), instructor_name = COALESCE(");
    qb.push_bind(patch.instructor_name.clone());
    qb.push(", instructor_name), organization = COALESCE(");
    qb.push_bind(patch.organization.clone());
    qb.push(", organization), is_revoked = is_revoked OR ");
    qb.push_bind(patch.revokes());
    qb.push(", updated_at = ");
    qb.push_bind(at);
    push_filter(&mut qb, filter);
    qb.push(format!(" RETURNING {COLUMNS}"));
    qb
}

fn delete_query(filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM certificates");
    push_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl CertificateBackend for PgBackend {
    async fn insert(&self, record: Certificate) -> Result<Certificate, BackendError> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "INSERT INTO certificates ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO NOTHING
             RETURNING {COLUMNS}"
        ))
        .bind(record.id.as_str())
        .bind(&record.recipient_name)
        .bind(&record.email)
        .bind(&record.course_name)
        .bind(record.issue_date)
        .bind(&record.instructor_name)
        .bind(&record.organization)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.is_revoked)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CertificateRow::into_record)
            .ok_or_else(|| BackendError::Conflict(record.id.to_string()))
    }

    async fn find_all(
        &self,
        filter: &Filter,
        order: Order,
    ) -> Result<Vec<Certificate>, BackendError> {
        let rows = select_query(filter, order)
            .build_query_as::<CertificateRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CertificateRow::into_record).collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Certificate>, BackendError> {
        let mut qb = select_query(filter, Order::Unordered);
        qb.push(" LIMIT 1");
        let row = qb
            .build_query_as::<CertificateRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CertificateRow::into_record))
    }

    async fn update_where(
        &self,
        filter: &Filter,
        patch: &CertificatePatch,
        at: DateTime<Utc>,
    ) -> Result<Vec<Certificate>, BackendError> {
        let rows = update_query(filter, patch, at)
            .build_query_as::<CertificateRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CertificateRow::into_record).collect())
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, BackendError> {
        let result = delete_query(filter).build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
        Ok(())
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: String,
    recipient_name: String,
    email: String,
    course_name: String,
    issue_date: NaiveDate,
    instructor_name: Option<String>,
    organization: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_revoked: bool,
}

impl CertificateRow {
    fn into_record(self) -> Certificate {
        Certificate {
            id: CertificateId::new(self.id),
            recipient_name: self.recipient_name,
            email: self.email,
            course_name: self.course_name,
            issue_date: self.issue_date,
            instructor_name: self.instructor_name,
            organization: self.organization,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_revoked: self.is_revoked,
        }
    }
}
