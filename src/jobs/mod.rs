//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance: sweeping expired cache
//! entries and checking that the database is still reachable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};

use crate::cache::TtlCache;
use crate::closing::HistoryPage;
use crate::store::HistoryQuery;

/// History cache owned by the closing service
pub type HistoryCache = TtlCache<HistoryQuery, Arc<HistoryPage>>;

// =========================================================================
// History Cache Sweep Job
// =========================================================================

/// Drop expired history pages so idle keys do not accumulate
pub fn purge_history_cache(cache: &HistoryCache) -> usize {
    let purged = cache.purge_expired();

    if purged > 0 {
        tracing::info!(
            entries_purged = purged,
            entries_left = cache.len(),
            "Purged expired history cache entries"
        );
    }

    purged
}

// =========================================================================
// Database Heartbeat Job
// =========================================================================

/// Round-trip to the database
pub async fn database_heartbeat(pool: &PgPool) -> Result<(), JobError> {
    crate::db::verify_connection(pool).await?;
    tracing::debug!("Database heartbeat ok");
    Ok(())
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for the history cache sweep (default: 5 minutes)
    pub cache_sweep_interval: Duration,
    /// Interval for the database heartbeat (default: 1 minute)
    pub heartbeat_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            cache_sweep_interval: Duration::from_secs(300),
            heartbeat_interval: Duration::from_secs(60),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    history_cache: Arc<HistoryCache>,
    pool: Option<PgPool>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    pub fn new(history_cache: Arc<HistoryCache>) -> Self {
        Self {
            history_cache,
            pool: None,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Also run the database heartbeat
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_config(mut self, config: JobSchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(
            cache_sweep_secs = self.config.cache_sweep_interval.as_secs(),
            heartbeat = self.pool.is_some(),
            "Job scheduler started"
        );

        let mut sweep_interval = interval(self.config.cache_sweep_interval);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat_interval = interval(self.config.heartbeat_interval);
        heartbeat_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sweep_interval.tick() => {
                    purge_history_cache(&self.history_cache);
                }
                _ = heartbeat_interval.tick(), if self.pool.is_some() => {
                    if let Some(pool) = &self.pool {
                        if let Err(e) = database_heartbeat(pool).await {
                            tracing::error!(error = %e, "Database heartbeat failed");
                        }
                    }
                }
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport {
            cache_entries_purged: purge_history_cache(&self.history_cache),
            ..Default::default()
        };

        if let Some(pool) = &self.pool {
            match database_heartbeat(pool).await {
                Ok(()) => report.database_reachable = Some(true),
                Err(e) => {
                    report.database_reachable = Some(false);
                    report.errors.push(format!("Database heartbeat: {}", e));
                }
            }
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub cache_entries_purged: usize,
    /// `None` when running on in-memory stores
    pub database_reachable: Option<bool>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache(clock: Arc<ManualClock>) -> Arc<HistoryCache> {
        Arc::new(TtlCache::new(Duration::from_secs(60), clock))
    }

    fn page() -> Arc<HistoryPage> {
        Arc::new(HistoryPage {
            closings: Vec::new(),
            total: 0,
        })
    }

    #[test]
    fn test_job_scheduler_config_default() {
        let config = JobSchedulerConfig::default();
        assert_eq!(config.cache_sweep_interval, Duration::from_secs(300));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_purge_history_cache() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(clock.clone());
        cache.insert(HistoryQuery::default(), page());

        assert_eq!(purge_history_cache(&cache), 0);
        clock.advance(Duration::from_secs(61));
        assert_eq!(purge_history_cache(&cache), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_run_all_once_without_database() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache(clock.clone());
        cache.insert(HistoryQuery::default(), page());
        clock.advance(Duration::from_secs(120));

        let report = JobScheduler::new(cache).run_all_once().await;
        assert_eq!(report.cache_entries_purged, 1);
        assert_eq!(report.database_reachable, None);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_maintenance_report_default() {
        let report = MaintenanceReport::default();
        assert_eq!(report.cache_entries_purged, 0);
        assert_eq!(report.errors.len(), 0);
    }
}
