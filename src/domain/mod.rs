//! Domain module
//!
//! Core domain types shared by the engine, the services and the API.

pub mod amount;
pub mod context;
pub mod denomination;
pub mod error;
pub mod events;
pub mod payment;

pub use amount::{format_currency, round_money, AmountError, CashAmount};
pub use context::OperationContext;
pub use denomination::DenominationBreakdown;
pub use error::{DomainError, MAX_OBSERVATIONS_LEN};
pub use events::ClosingEvent;
pub use payment::{MethodTotals, PaymentMethod, PaymentSummary};
