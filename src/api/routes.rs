//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::closing::{ClosingService, ClosingSubmission, ClosingView, PreviewRequest, PreviewResult};
use crate::domain::{format_currency, CashAmount, OperationContext, PaymentMethod, PaymentSummary};
use crate::error::AppError;
use crate::sales::{RecordSaleCommand, Sale, SalesService};
use crate::store::HistoryQuery;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub closings: Arc<ClosingService>,
    pub sales: SalesService,
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct ClosingResponse {
    #[serde(flatten)]
    pub closing: ClosingView,
    pub difference_display: String,
}

impl From<ClosingView> for ClosingResponse {
    fn from(closing: ClosingView) -> Self {
        let difference_display = format_currency(closing.reconciliation.difference);
        Self {
            closing,
            difference_display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub preview: PreviewResult,
    pub difference_display: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub closings: Vec<ClosingResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub amount: CashAmount,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SalesSummaryResponse {
    pub business_date: NaiveDate,
    pub expected_cash: Decimal,
    pub expected_cash_display: String,
    pub payment_summary: PaymentSummary,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/closings", post(submit_closing).get(list_closings))
        .route("/closings/preview", post(preview_closing))
        .route("/closings/:closing_id", get(get_closing))
        .route("/sales", post(record_sale))
        .route("/sales/summary", get(sales_summary))
}

// =========================================================================
// POST /closings/preview
// =========================================================================

/// Classify a count without recording it
async fn preview_closing(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, AppError> {
    let Json(request) = payload?;

    let preview = state.closings.preview(request).await?;
    let difference_display = format_currency(preview.reconciliation.difference);

    Ok(Json(PreviewResponse {
        preview,
        difference_display,
    }))
}

// =========================================================================
// POST /closings
// =========================================================================

/// Close the drawer for a business date
async fn submit_closing(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<ClosingSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<ClosingResponse>), AppError> {
    let Json(submission) = payload?;

    let view = state.closings.submit(submission, &context).await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

// =========================================================================
// GET /closings
// =========================================================================

/// Closing history, newest first
async fn list_closings(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;
    let query = query.normalized();
    let (limit, offset) = (query.limit, query.offset);

    let page = state.closings.history(query).await?;

    Ok(Json(HistoryResponse {
        closings: page.closings.iter().cloned().map(ClosingResponse::from).collect(),
        total: page.total,
        limit,
        offset,
    }))
}

// =========================================================================
// GET /closings/:closing_id
// =========================================================================

async fn get_closing(
    State(state): State<AppState>,
    closing_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ClosingResponse>, AppError> {
    let Path(closing_id) = closing_id?;

    let view = state.closings.detail(closing_id).await?;

    Ok(Json(view.into()))
}

// =========================================================================
// POST /sales
// =========================================================================

/// Record a sale in the ledger
async fn record_sale(
    State(state): State<AppState>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let Json(request) = payload?;

    let command = RecordSaleCommand::new(
        request.business_date.unwrap_or_else(|| Utc::now().date_naive()),
        request.amount,
        request.payment_method,
    );
    let sale = state.sales.record(command).await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

// =========================================================================
// GET /sales/summary
// =========================================================================

/// Per-method totals and expected drawer cash for a date
async fn sales_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SalesSummaryResponse>, AppError> {
    let Query(query) = query?;
    let business_date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let payment_summary = state.sales.summary(business_date).await?;
    let expected_cash = payment_summary.expected_cash();

    Ok(Json(SalesSummaryResponse {
        business_date,
        expected_cash,
        expected_cash_display: format_currency(expected_cash),
        payment_summary,
    }))
}
