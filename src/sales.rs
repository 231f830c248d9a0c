//! Sales ledger service
//!
//! Records sales with their payment method. Cash sales of a business date
//! are the source of the expected cash for that date's closing.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::ClosingEventBus;
use crate::domain::{CashAmount, ClosingEvent, DomainError, PaymentMethod, PaymentSummary};
use crate::error::AppError;
use crate::store::{ClosingRepository, SalesLedger};

/// A recorded sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub business_date: NaiveDate,
    pub amount: CashAmount,
    pub payment_method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
}

/// Command to record a sale
#[derive(Debug, Clone)]
pub struct RecordSaleCommand {
    pub business_date: NaiveDate,
    pub amount: CashAmount,
    pub payment_method: PaymentMethod,
}

impl RecordSaleCommand {
    pub fn new(business_date: NaiveDate, amount: CashAmount, payment_method: PaymentMethod) -> Self {
        Self {
            business_date,
            amount,
            payment_method,
        }
    }
}

/// Service wrapping the sales ledger
#[derive(Clone)]
pub struct SalesService {
    ledger: Arc<dyn SalesLedger>,
    closings: Arc<dyn ClosingRepository>,
    events: Arc<ClosingEventBus>,
}

impl SalesService {
    pub fn new(
        ledger: Arc<dyn SalesLedger>,
        closings: Arc<dyn ClosingRepository>,
        events: Arc<ClosingEventBus>,
    ) -> Self {
        Self {
            ledger,
            closings,
            events,
        }
    }

    /// Record a sale and announce it.
    ///
    /// A closed business date takes no more sales, so the stored expected
    /// cash of its closing keeps matching the ledger.
    pub async fn record(&self, command: RecordSaleCommand) -> Result<Sale, AppError> {
        if command.amount.is_zero() {
            return Err(DomainError::invalid_input("sale amount must be positive").into());
        }

        if self.closings.find_by_date(command.business_date).await?.is_some() {
            tracing::warn!(
                business_date = %command.business_date,
                "Sale rejected for closed business date"
            );
            return Err(DomainError::BusinessDateClosed(command.business_date).into());
        }

        let sale = Sale {
            id: Uuid::new_v4(),
            business_date: command.business_date,
            amount: command.amount,
            payment_method: command.payment_method,
            recorded_at: Utc::now(),
        };

        self.ledger.record_sale(&sale).await?;

        tracing::debug!(
            sale_id = %sale.id,
            business_date = %sale.business_date,
            payment_method = %sale.payment_method,
            amount = %sale.amount,
            "Sale recorded"
        );

        self.events.publish(&ClosingEvent::SaleRecorded {
            sale_id: sale.id,
            business_date: sale.business_date,
            payment_method: sale.payment_method,
            amount: sale.amount.value(),
        });

        Ok(sale)
    }

    /// Per-method totals for a business date
    pub async fn summary(&self, date: NaiveDate) -> Result<PaymentSummary, AppError> {
        Ok(self.ledger.payment_summary(date).await?)
    }

    /// Cash the drawer should hold at the end of `date`
    pub async fn expected_cash(&self, date: NaiveDate) -> Result<CashAmount, AppError> {
        let summary = self.summary(date).await?;
        Ok(CashAmount::new(summary.expected_cash())?)
    }
}

impl std::fmt::Debug for SalesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesService").finish_non_exhaustive()
    }
}
