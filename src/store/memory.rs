//! In-memory stores
//!
//! Used when no `DATABASE_URL` is configured and throughout the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::closing::ClosingRecord;
use crate::domain::PaymentSummary;
use crate::sales::Sale;

use super::{ClosingPage, ClosingRepository, HistoryQuery, SalesLedger, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryClosingRepository {
    records: RwLock<HashMap<Uuid, ClosingRecord>>,
}

impl InMemoryClosingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClosingRepository for InMemoryClosingRepository {
    async fn insert(&self, record: &ClosingRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        // Same check the unique index enforces in Postgres
        if records
            .values()
            .any(|existing| existing.business_date == record.business_date)
        {
            return Err(StoreError::DuplicateClosing(record.business_date));
        }

        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ClosingRecord>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<ClosingRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.business_date == date)
            .cloned())
    }

    async fn list(&self, query: &HistoryQuery) -> Result<ClosingPage, StoreError> {
        let records = self.records.read().await;

        let mut matching: Vec<&ClosingRecord> = records
            .values()
            .filter(|record| query.matches(record.business_date))
            .collect();
        matching.sort_by(|a, b| b.business_date.cmp(&a.business_date));

        let total = matching.len() as i64;
        let records = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(ClosingPage { records, total })
    }
}

#[derive(Debug, Default)]
pub struct InMemorySalesLedger {
    sales: RwLock<Vec<Sale>>,
}

impl InMemorySalesLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SalesLedger for InMemorySalesLedger {
    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        self.sales.write().await.push(sale.clone());
        Ok(())
    }

    async fn payment_summary(&self, date: NaiveDate) -> Result<PaymentSummary, StoreError> {
        Ok(self
            .sales
            .read()
            .await
            .iter()
            .filter(|sale| sale.business_date == date)
            .map(|sale| (sale.payment_method, sale.amount.value()))
            .collect())
    }
}
