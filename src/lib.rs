//! cash_closing Library
//!
//! Cash-drawer reconciliation engine and the closing service around it.
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod app;
pub mod cache;
pub mod closing;
pub mod domain;
pub mod jobs;
pub mod reconcile;
pub mod sales;
pub mod store;
pub mod workflow;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{AmountError, CashAmount, DomainError, OperationContext};
pub use reconcile::{reconcile, ReconciliationInput, ReconciliationResult, ScoringThresholds};
