//! Domain Events
//!
//! Facts published after a mutation so that read-side caches can react.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentMethod;

/// Events emitted by the closing and sales services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClosingEvent {
    /// A closing record was persisted
    ClosingRecorded {
        closing_id: Uuid,
        business_date: NaiveDate,
        difference: Decimal,
        recorded_at: DateTime<Utc>,
    },

    /// A sale was added to the ledger (changes the expected cash)
    SaleRecorded {
        sale_id: Uuid,
        business_date: NaiveDate,
        payment_method: PaymentMethod,
        amount: Decimal,
    },
}

impl ClosingEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ClosingEvent::ClosingRecorded { .. } => "ClosingRecorded",
            ClosingEvent::SaleRecorded { .. } => "SaleRecorded",
        }
    }

    /// Business date the event relates to
    pub fn business_date(&self) -> NaiveDate {
        match self {
            ClosingEvent::ClosingRecorded { business_date, .. } => *business_date,
            ClosingEvent::SaleRecorded { business_date, .. } => *business_date,
        }
    }
}
