//! Postgres stores
//!
//! Schema lives in `migrations/001_cash_closing.sql`. The unique index on
//! `cash_closings.business_date` backs the one-closing-per-day rule.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::closing::ClosingRecord;
use crate::domain::{DenominationBreakdown, MethodTotals, PaymentMethod, PaymentSummary};
use crate::sales::Sale;

use super::{ClosingPage, ClosingRepository, HistoryQuery, SalesLedger, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

const CLOSING_COLUMNS: &str = r#"
    id, business_date, operator, expected_cash, counted_cash, difference,
    observations, count_duration_seconds, denomination_breakdown,
    payment_summary, security_acknowledged, closed_at
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn closing_from_row(row: &PgRow) -> Result<ClosingRecord, StoreError> {
    let duration: Option<i64> = row.try_get("count_duration_seconds")?;
    let count_duration_seconds = duration
        .map(|secs| {
            u32::try_from(secs)
                .map_err(|_| StoreError::Corrupt(format!("count_duration_seconds {}", secs)))
        })
        .transpose()?;

    let breakdown: Option<serde_json::Value> = row.try_get("denomination_breakdown")?;
    let denomination_breakdown = breakdown
        .map(serde_json::from_value::<DenominationBreakdown>)
        .transpose()?;

    let summary: serde_json::Value = row.try_get("payment_summary")?;

    Ok(ClosingRecord {
        id: row.try_get("id")?,
        business_date: row.try_get("business_date")?,
        operator: row.try_get("operator")?,
        expected_cash: row.try_get("expected_cash")?,
        counted_cash: row.try_get("counted_cash")?,
        difference: row.try_get("difference")?,
        observations: row.try_get("observations")?,
        count_duration_seconds,
        denomination_breakdown,
        payment_summary: serde_json::from_value(summary)?,
        security_acknowledged: row.try_get("security_acknowledged")?,
        closed_at: row.try_get("closed_at")?,
    })
}

/// Closing records in Postgres
#[derive(Debug, Clone)]
pub struct PgClosingRepository {
    pool: PgPool,
}

impl PgClosingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClosingRepository for PgClosingRepository {
    async fn insert(&self, record: &ClosingRecord) -> Result<(), StoreError> {
        let breakdown = record
            .denomination_breakdown
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let summary = serde_json::to_value(&record.payment_summary)?;

        let result = sqlx::query(
            r#"
            INSERT INTO cash_closings (
                id, business_date, operator, expected_cash, counted_cash, difference,
                observations, count_duration_seconds, denomination_breakdown,
                payment_summary, security_acknowledged, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(record.business_date)
        .bind(&record.operator)
        .bind(record.expected_cash)
        .bind(record.counted_cash)
        .bind(record.difference)
        .bind(&record.observations)
        .bind(record.count_duration_seconds.map(i64::from))
        .bind(breakdown)
        .bind(summary)
        .bind(record.security_acknowledged)
        .bind(record.closed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateClosing(record.business_date))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<ClosingRecord>, StoreError> {
        let sql = format!("SELECT {} FROM cash_closings WHERE id = $1", CLOSING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(closing_from_row).transpose()
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<ClosingRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM cash_closings WHERE business_date = $1",
            CLOSING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(closing_from_row).transpose()
    }

    async fn list(&self, query: &HistoryQuery) -> Result<ClosingPage, StoreError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM cash_closings
            WHERE ($1::date IS NULL OR business_date >= $1)
              AND ($2::date IS NULL OR business_date <= $2)
            "#,
        )
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {} FROM cash_closings
            WHERE ($1::date IS NULL OR business_date >= $1)
              AND ($2::date IS NULL OR business_date <= $2)
            ORDER BY business_date DESC
            LIMIT $3 OFFSET $4
            "#,
            CLOSING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(query.from)
            .bind(query.to)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(closing_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClosingPage { records, total })
    }
}

/// Sales ledger in Postgres
#[derive(Debug, Clone)]
pub struct PgSalesLedger {
    pool: PgPool,
}

impl PgSalesLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalesLedger for PgSalesLedger {
    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, business_date, amount, payment_method, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(sale.id)
        .bind(sale.business_date)
        .bind(sale.amount.value())
        .bind(sale.payment_method.as_str())
        .bind(sale.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn payment_summary(&self, date: NaiveDate) -> Result<PaymentSummary, StoreError> {
        let rows: Vec<(String, i64, Decimal)> = sqlx::query_as(
            r#"
            SELECT payment_method, COUNT(*), COALESCE(SUM(amount), 0)
            FROM sales
            WHERE business_date = $1
            GROUP BY payment_method
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let mut summary = PaymentSummary::new();
        for (method, count, total) in rows {
            let method: PaymentMethod = method.parse().map_err(StoreError::Corrupt)?;
            summary.set_totals(
                method,
                MethodTotals {
                    count: count.max(0) as u64,
                    total,
                },
            );
        }

        Ok(summary)
    }
}
