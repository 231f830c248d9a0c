//! Closing service
//!
//! Orchestrates a closing: loads the expected cash from the sales ledger,
//! runs the engine server-side, persists the record and publishes an
//! event. History reads go through a TTL cache that the event bus keeps
//! consistent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::{Clock, ClosingEventBus, TtlCache};
use crate::domain::{
    CashAmount, ClosingEvent, DenominationBreakdown, DomainError, OperationContext,
    PaymentSummary,
};
use crate::error::AppError;
use crate::reconcile::{reconcile, ReconciliationInput, ReconciliationResult, ScoringThresholds};
use crate::store::{ClosingRepository, HistoryQuery, SalesLedger, StoreError};

use super::{ClosingRecord, ClosingSubmission, ClosingView};

/// Dry-run request: what would this count look like if submitted now?
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub counted_cash: CashAmount,
    #[serde(default)]
    pub count_duration_seconds: Option<u32>,
    #[serde(default)]
    pub denomination_breakdown: Option<DenominationBreakdown>,
    #[serde(default)]
    pub business_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResult {
    pub business_date: NaiveDate,
    pub payment_summary: PaymentSummary,
    pub reconciliation: ReconciliationResult,
}

/// One cached page of history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub closings: Vec<ClosingView>,
    pub total: i64,
}

/// Service for closing the drawer and reading past closings
pub struct ClosingService {
    closings: Arc<dyn ClosingRepository>,
    sales: Arc<dyn SalesLedger>,
    thresholds: ScoringThresholds,
    history_cache: Arc<TtlCache<HistoryQuery, Arc<HistoryPage>>>,
    events: Arc<ClosingEventBus>,
}

impl ClosingService {
    /// Create the service and wire history invalidation into the bus.
    pub fn new(
        closings: Arc<dyn ClosingRepository>,
        sales: Arc<dyn SalesLedger>,
        thresholds: ScoringThresholds,
        events: Arc<ClosingEventBus>,
        history_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history_cache: Arc<TtlCache<HistoryQuery, Arc<HistoryPage>>> =
            Arc::new(TtlCache::new(history_ttl, clock));

        let cache = history_cache.clone();
        events.subscribe(Arc::new(move |event: &ClosingEvent| {
            if let ClosingEvent::ClosingRecorded { business_date, .. } = event {
                let dropped = cache.invalidate_where(|query| query.matches(*business_date));
                tracing::debug!(
                    business_date = %business_date,
                    dropped = dropped,
                    "Invalidated closing history cache"
                );
            }
        }));

        Self {
            closings,
            sales,
            thresholds,
            history_cache,
            events,
        }
    }

    pub fn thresholds(&self) -> &ScoringThresholds {
        &self.thresholds
    }

    pub fn history_cache(&self) -> &Arc<TtlCache<HistoryQuery, Arc<HistoryPage>>> {
        &self.history_cache
    }

    /// Classify a count without persisting anything.
    pub async fn preview(&self, request: PreviewRequest) -> Result<PreviewResult, AppError> {
        let business_date = request.business_date.unwrap_or_else(today);
        let payment_summary = self.sales.payment_summary(business_date).await?;

        let mut input = ReconciliationInput::new(
            CashAmount::new(payment_summary.expected_cash())?,
            request.counted_cash,
        );
        input.count_duration_seconds = request.count_duration_seconds;
        input.manual_count_total = request
            .denomination_breakdown
            .as_ref()
            .map(DenominationBreakdown::total)
            .transpose()?;

        let reconciliation = reconcile(&input, &self.thresholds)?;

        Ok(PreviewResult {
            business_date,
            payment_summary,
            reconciliation,
        })
    }

    /// Validate, reconcile server-side and persist a closing.
    pub async fn submit(
        &self,
        submission: ClosingSubmission,
        context: &OperationContext,
    ) -> Result<ClosingView, AppError> {
        submission.validate()?;

        let business_date = submission.business_date.unwrap_or_else(today);
        if self.closings.find_by_date(business_date).await?.is_some() {
            return Err(DomainError::ClosingAlreadyExists(business_date).into());
        }

        let payment_summary = self.sales.payment_summary(business_date).await?;
        let expected_cash = CashAmount::new(payment_summary.expected_cash())?;

        let mut input = ReconciliationInput::new(expected_cash, submission.counted_cash);
        input.count_duration_seconds = submission.count_duration_seconds;
        input.manual_count_total = submission
            .denomination_breakdown
            .as_ref()
            .map(DenominationBreakdown::total)
            .transpose()?;

        let reconciliation = reconcile(&input, &self.thresholds)?;

        let record = ClosingRecord {
            id: Uuid::new_v4(),
            business_date,
            operator: context.actor(),
            expected_cash: expected_cash.value(),
            counted_cash: submission.counted_cash.value(),
            difference: reconciliation.difference,
            observations: submission.clean_observations(),
            count_duration_seconds: submission.count_duration_seconds,
            denomination_breakdown: submission.denomination_breakdown.clone(),
            payment_summary,
            security_acknowledged: submission.security_acknowledged,
            closed_at: Utc::now(),
        };

        match self.closings.insert(&record).await {
            Ok(()) => {}
            Err(StoreError::DuplicateClosing(date)) => {
                return Err(DomainError::ClosingAlreadyExists(date).into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            closing_id = %record.id,
            business_date = %record.business_date,
            operator = %record.operator,
            state = %reconciliation.state,
            risk_level = ?reconciliation.risk_level,
            difference = %reconciliation.difference,
            correlation_id = ?context.correlation_id,
            "Cash closing recorded"
        );

        self.events.publish(&ClosingEvent::ClosingRecorded {
            closing_id: record.id,
            business_date: record.business_date,
            difference: record.difference,
            recorded_at: record.closed_at,
        });

        Ok(ClosingView {
            record,
            reconciliation,
        })
    }

    /// Closing history, re-classified per row, served from cache when fresh.
    pub async fn history(&self, query: HistoryQuery) -> Result<Arc<HistoryPage>, AppError> {
        let query = query.normalized();

        if let Some(page) = self.history_cache.get(&query) {
            tracing::debug!(?query, "Closing history cache hit");
            return Ok(page);
        }

        // Taken before the read so a concurrent write can veto the fill
        let generation = self.history_cache.generation();
        let page = self.closings.list(&query).await?;
        let closings = page
            .records
            .into_iter()
            .map(|record| ClosingView::build(record, &self.thresholds))
            .collect::<Result<Vec<_>, _>>()?;

        let page = Arc::new(HistoryPage {
            closings,
            total: page.total,
        });
        if !self
            .history_cache
            .insert_if_current(query, page.clone(), generation)
        {
            tracing::debug!("Closing history changed during read, page not cached");
        }

        Ok(page)
    }

    /// One closing with its classification.
    pub async fn detail(&self, id: Uuid) -> Result<ClosingView, AppError> {
        let record = self
            .closings
            .find(id)
            .await?
            .ok_or_else(|| DomainError::ClosingNotFound(id.to_string()))?;

        Ok(ClosingView::build(record, &self.thresholds)?)
    }
}

impl std::fmt::Debug for ClosingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosingService")
            .field("thresholds", &self.thresholds)
            .field("history_cache", &self.history_cache)
            .finish_non_exhaustive()
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::domain::PaymentMethod;
    use crate::reconcile::{EfficiencyBand, RecommendationKind, ReconciliationState, RiskLevel};
    use crate::sales::Sale;
    use crate::store::{InMemoryClosingRepository, InMemorySalesLedger};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        service: ClosingService,
        sales: Arc<InMemorySalesLedger>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let sales = Arc::new(InMemorySalesLedger::new());
        let clock = Arc::new(ManualClock::new());
        let service = ClosingService::new(
            Arc::new(InMemoryClosingRepository::new()),
            sales.clone(),
            ScoringThresholds::default(),
            Arc::new(ClosingEventBus::new()),
            Duration::from_secs(60),
            clock.clone(),
        );
        Fixture {
            service,
            sales,
            clock,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn cash(value: Decimal) -> CashAmount {
        CashAmount::new(value).unwrap()
    }

    async fn sell(ledger: &InMemorySalesLedger, date: NaiveDate, amount: Decimal, method: PaymentMethod) {
        use crate::store::SalesLedger;
        ledger
            .record_sale(&Sale {
                id: Uuid::new_v4(),
                business_date: date,
                amount: cash(amount),
                payment_method: method,
                recorded_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_recomputes_from_ledger() {
        let fx = fixture();
        sell(&fx.sales, day(1), dec!(150), PaymentMethod::Cash).await;
        sell(&fx.sales, day(1), dec!(50), PaymentMethod::Cash).await;
        sell(&fx.sales, day(1), dec!(80), PaymentMethod::Card).await;

        let submission = ClosingSubmission::new(cash(dec!(215)))
            .acknowledged()
            .with_duration(700)
            .for_date(day(1));
        let context = OperationContext::new().with_operator("nina");

        let view = fx.service.submit(submission, &context).await.unwrap();

        assert_eq!(view.record.expected_cash, dec!(200));
        assert_eq!(view.record.operator, "nina");
        assert_eq!(view.reconciliation.difference, dec!(15));
        assert_eq!(view.reconciliation.state, ReconciliationState::Surplus);
        assert_eq!(view.reconciliation.precision_percent, dec!(92.5));
        assert_eq!(view.reconciliation.risk_level, RiskLevel::Medium);
        assert_eq!(view.reconciliation.efficiency_band, EfficiencyBand::Slow);
        assert_eq!(view.record.payment_summary.get(PaymentMethod::Card).total, dec!(80));
    }

    #[tokio::test]
    async fn test_submit_without_sales_is_balanced_at_zero() {
        let fx = fixture();
        let submission = ClosingSubmission::new(CashAmount::zero())
            .acknowledged()
            .for_date(day(2));

        let view = fx.service.submit(submission, &OperationContext::new()).await.unwrap();
        assert_eq!(view.reconciliation.state, ReconciliationState::Balanced);
        assert_eq!(view.reconciliation.precision_percent, dec!(100));
        assert_eq!(view.record.operator, "unknown");
    }

    #[tokio::test]
    async fn test_second_closing_same_date_rejected() {
        let fx = fixture();
        let submission = ClosingSubmission::new(cash(dec!(10))).acknowledged().for_date(day(3));

        fx.service.submit(submission.clone(), &OperationContext::new()).await.unwrap();
        let err = fx.service.submit(submission, &OperationContext::new()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Domain(DomainError::ClosingAlreadyExists(d)) if d == day(3)
        ));
    }

    #[tokio::test]
    async fn test_submit_validates_form() {
        let fx = fixture();
        let submission = ClosingSubmission::new(cash(dec!(10))).for_date(day(4));

        let err = fx.service.submit(submission, &OperationContext::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::SecurityNotAcknowledged)));
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let fx = fixture();
        sell(&fx.sales, day(5), dec!(100), PaymentMethod::Cash).await;

        let preview = fx
            .service
            .preview(PreviewRequest {
                counted_cash: cash(dec!(88)),
                count_duration_seconds: None,
                denomination_breakdown: None,
                business_date: Some(day(5)),
            })
            .await
            .unwrap();

        assert_eq!(preview.reconciliation.risk_level, RiskLevel::High);
        let page = fx.service.history(HistoryQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_preview_flags_breakdown_mismatch() {
        let fx = fixture();
        let mut breakdown = DenominationBreakdown::new();
        breakdown.add(dec!(10), 2).unwrap();

        let preview = fx
            .service
            .preview(PreviewRequest {
                counted_cash: cash(dec!(25)),
                count_duration_seconds: Some(60),
                denomination_breakdown: Some(breakdown),
                business_date: Some(day(6)),
            })
            .await
            .unwrap();

        let kinds: Vec<_> = preview
            .reconciliation
            .recommendations
            .iter()
            .map(|r| r.kind)
            .collect();
        assert!(kinds.contains(&RecommendationKind::ManualCountMismatch));
    }

    #[tokio::test]
    async fn test_history_cache_invalidated_by_new_closing() {
        let fx = fixture();
        let context = OperationContext::new();

        fx.service
            .submit(ClosingSubmission::new(cash(dec!(1))).acknowledged().for_date(day(7)), &context)
            .await
            .unwrap();
        let first = fx.service.history(HistoryQuery::default()).await.unwrap();
        assert_eq!(first.total, 1);
        assert_eq!(fx.service.history_cache().len(), 1);

        // Cached page is reused
        let again = fx.service.history(HistoryQuery::default()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        fx.service
            .submit(ClosingSubmission::new(cash(dec!(2))).acknowledged().for_date(day(8)), &context)
            .await
            .unwrap();
        let second = fx.service.history(HistoryQuery::default()).await.unwrap();
        assert_eq!(second.total, 2);
        assert_eq!(second.closings[0].record.business_date, day(8));
    }

    /// Repository whose first `list` holds its snapshot until released
    struct GatedRepository {
        inner: InMemoryClosingRepository,
        gate_open: std::sync::atomic::AtomicBool,
        listed: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl ClosingRepository for GatedRepository {
        async fn insert(&self, record: &ClosingRecord) -> Result<(), StoreError> {
            self.inner.insert(record).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<ClosingRecord>, StoreError> {
            self.inner.find(id).await
        }

        async fn find_by_date(&self, date: NaiveDate) -> Result<Option<ClosingRecord>, StoreError> {
            self.inner.find_by_date(date).await
        }

        async fn list(&self, query: &HistoryQuery) -> Result<crate::store::ClosingPage, StoreError> {
            let page = self.inner.list(query).await?;
            if self.gate_open.swap(false, std::sync::atomic::Ordering::SeqCst) {
                self.listed.notify_one();
                self.release.notified().await;
            }
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_history_read_racing_a_submit_is_not_cached() {
        let repository = Arc::new(GatedRepository {
            inner: InMemoryClosingRepository::new(),
            gate_open: std::sync::atomic::AtomicBool::new(true),
            listed: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let service = ClosingService::new(
            repository.clone(),
            Arc::new(InMemorySalesLedger::new()),
            ScoringThresholds::default(),
            Arc::new(ClosingEventBus::new()),
            Duration::from_secs(60),
            Arc::new(ManualClock::new()),
        );

        let reader = service.history(HistoryQuery::default());
        let writer = async {
            repository.listed.notified().await;
            let submission = ClosingSubmission::new(cash(dec!(5))).acknowledged().for_date(day(2));
            service.submit(submission, &OperationContext::new()).await.unwrap();
            repository.release.notify_one();
        };
        let (stale, ()) = tokio::join!(reader, writer);

        // The in-flight read saw the state before the write
        assert_eq!(stale.unwrap().total, 0);
        assert!(service.history_cache().is_empty());

        let fresh = service.history(HistoryQuery::default()).await.unwrap();
        assert_eq!(fresh.total, 1);
    }

    #[tokio::test]
    async fn test_history_cache_expires() {
        let fx = fixture();
        let first = fx.service.history(HistoryQuery::default()).await.unwrap();

        fx.clock.advance(Duration::from_secs(61));
        let second = fx.service.history(HistoryQuery::default()).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_history_date_filter() {
        let fx = fixture();
        let context = OperationContext::new();
        for d in [10, 11, 12] {
            fx.service
                .submit(ClosingSubmission::new(cash(dec!(0))).acknowledged().for_date(day(d)), &context)
                .await
                .unwrap();
        }

        let page = fx
            .service
            .history(HistoryQuery {
                from: Some(day(11)),
                to: Some(day(12)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let fx = fixture();
        let err = fx.service.detail(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ClosingNotFound(_))));
    }

    #[tokio::test]
    async fn test_detail_rederives_classification() {
        let fx = fixture();
        sell(&fx.sales, day(13), dec!(100), PaymentMethod::Cash).await;
        let view = fx
            .service
            .submit(
                ClosingSubmission::new(cash(dec!(97))).acknowledged().for_date(day(13)),
                &OperationContext::new(),
            )
            .await
            .unwrap();

        let detail = fx.service.detail(view.record.id).await.unwrap();
        assert_eq!(detail.reconciliation, view.reconciliation);
        assert_eq!(detail.reconciliation.precision_percent, dec!(97));
    }
}
