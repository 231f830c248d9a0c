//! Application wiring
//!
//! Assembles stores, services and the shared event bus from `Config`.

use std::sync::Arc;

use sqlx::PgPool;

use crate::api::AppState;
use crate::cache::{Clock, ClosingEventBus};
use crate::closing::ClosingService;
use crate::config::Config;
use crate::jobs::{JobScheduler, JobSchedulerConfig};
use crate::sales::SalesService;
use crate::store::{
    ClosingRepository, InMemoryClosingRepository, InMemorySalesLedger, PgClosingRepository,
    PgSalesLedger, SalesLedger,
};

/// Services ready to be served
pub struct Application {
    pub state: AppState,
    pub events: Arc<ClosingEventBus>,
    pool: Option<PgPool>,
    sweep_interval: std::time::Duration,
}

impl Application {
    /// Stores kept in process memory
    pub fn in_memory(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(
            config,
            Arc::new(InMemoryClosingRepository::new()),
            Arc::new(InMemorySalesLedger::new()),
            clock,
            None,
        )
    }

    /// Stores backed by Postgres
    pub fn postgres(config: &Config, pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(
            config,
            Arc::new(PgClosingRepository::new(pool.clone())),
            Arc::new(PgSalesLedger::new(pool.clone())),
            clock,
            Some(pool),
        )
    }

    fn assemble(
        config: &Config,
        closings: Arc<dyn ClosingRepository>,
        ledger: Arc<dyn SalesLedger>,
        clock: Arc<dyn Clock>,
        pool: Option<PgPool>,
    ) -> Self {
        let events = Arc::new(ClosingEventBus::new());

        let closing_service = ClosingService::new(
            closings.clone(),
            ledger.clone(),
            config.thresholds.clone(),
            events.clone(),
            config.history_cache_ttl,
            clock,
        );
        let sales = SalesService::new(ledger, closings, events.clone());

        Self {
            state: AppState {
                closings: Arc::new(closing_service),
                sales,
            },
            events,
            pool,
            sweep_interval: config.cache_sweep_interval,
        }
    }

    /// Maintenance jobs for these services
    pub fn scheduler(&self) -> JobScheduler {
        let scheduler = JobScheduler::new(self.state.closings.history_cache().clone()).with_config(
            JobSchedulerConfig {
                cache_sweep_interval: self.sweep_interval,
                ..Default::default()
            },
        );

        match &self.pool {
            Some(pool) => scheduler.with_pool(pool.clone()),
            None => scheduler,
        }
    }
}
