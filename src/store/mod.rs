//! Store module
//!
//! Persistence seams for closing records and the sales ledger, with a
//! Postgres implementation and an in-memory one for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::closing::ClosingRecord;
use crate::domain::PaymentSummary;
use crate::sales::Sale;

pub use error::StoreError;
pub use memory::{InMemoryClosingRepository, InMemorySalesLedger};
pub use postgres::{PgClosingRepository, PgSalesLedger};

/// Maximum page size for history listings
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// Filters for the closing history
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl HistoryQuery {
    /// Clamp paging to sane bounds
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_HISTORY_LIMIT);
        self.offset = self.offset.max(0);
        self
    }

    /// Whether a business date falls inside the date filter
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// One page of closing history
#[derive(Debug, Clone)]
pub struct ClosingPage {
    pub records: Vec<ClosingRecord>,
    pub total: i64,
}

/// Closing record persistence
#[async_trait]
pub trait ClosingRepository: Send + Sync {
    /// Persist a new record; one record per business date.
    async fn insert(&self, record: &ClosingRecord) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<ClosingRecord>, StoreError>;

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<ClosingRecord>, StoreError>;

    /// Records matching the query, newest business date first
    async fn list(&self, query: &HistoryQuery) -> Result<ClosingPage, StoreError>;
}

/// Sales ledger persistence
#[async_trait]
pub trait SalesLedger: Send + Sync {
    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError>;

    /// Per-method totals of one business date
    async fn payment_summary(&self, date: NaiveDate) -> Result<PaymentSummary, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_defaults() {
        let query: HistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, HistoryQuery::default());
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_history_query_normalized() {
        let query = HistoryQuery {
            limit: 10_000,
            offset: -3,
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.limit, MAX_HISTORY_LIMIT);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_history_query_matches_inclusive_range() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let query = HistoryQuery {
            from: Some(d(10)),
            to: Some(d(20)),
            ..Default::default()
        };

        assert!(query.matches(d(10)));
        assert!(query.matches(d(20)));
        assert!(!query.matches(d(9)));
        assert!(!query.matches(d(21)));
        assert!(HistoryQuery::default().matches(d(1)));
    }
}
