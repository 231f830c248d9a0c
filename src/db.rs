//! Database module
//!
//! Connectivity and schema checks. Schema changes live as raw SQL in
//! `migrations/`.

use sqlx::PgPool;

/// Tables the Postgres stores read and write
pub const REQUIRED_TABLES: &[&str] = &["cash_closings", "sales"];

/// Check the database answers queries
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    // One closing per business date is enforced by this index
    let has_unique_date: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM pg_indexes
            WHERE schemaname = 'public'
              AND tablename = 'cash_closings'
              AND indexname = 'cash_closings_business_date_key'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !has_unique_date {
        tracing::error!("Unique index on cash_closings.business_date is missing");
        return Ok(false);
    }

    Ok(true)
}
