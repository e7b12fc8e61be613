//! Harvest coordinator - main orchestration logic
//!
//! This module sequences the two phases of a harvest run:
//! - Listing phase: one sequential session walks the paginated search
//!   results and fills the task queue
//! - Harvest phase: the worker pool drains the queue against the catalog
//!
//! The coordinator also owns cross-phase concerns: catalog recovery at
//! startup, the cooperative stop handle, final statistics, and the backup
//! snapshot that runs even when a phase fails.

use crate::config::Config;
use crate::crawler::listing::{ListingCrawler, ListingOutcome};
use crate::driver::SessionFactory;
use crate::extract::{Extractor, HeuristicExtractor};
use crate::queue::TaskQueue;
use crate::store::CatalogStore;
use crate::worker::WorkerPool;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Final counts reported at the end of a run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub completed: usize,
    pub failed: usize,
    pub stored: usize,
    pub pages_visited: u32,
    pub elapsed: Duration,

    /// Set when the listing walk aborted early; harvested work is intact
    pub listing_aborted: Option<String>,
}

/// Cooperative stop signal for an in-flight run
///
/// Stopping pauses the queue (no new dequeues) and tells workers to exit
/// after their current task; nothing in flight is pre-empted.
#[derive(Clone)]
pub struct StopHandle {
    queue: Arc<TaskQueue>,
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        tracing::info!("Stop requested: pausing queue and stopping workers");
        self.queue.pause();
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    factory: Arc<dyn SessionFactory>,
    queue: Arc<TaskQueue>,
    store: Arc<CatalogStore>,
    extractor: Arc<dyn Extractor>,
    stop: Arc<AtomicBool>,
}

impl Coordinator {
    /// Creates a coordinator with the default heuristic extractor
    pub fn new(config: Config, factory: Arc<dyn SessionFactory>) -> Self {
        let queue = Arc::new(TaskQueue::new(config.harvest.retry_attempts));
        let store = Arc::new(CatalogStore::new(&config.output.catalog_path));

        Self {
            config: Arc::new(config),
            factory,
            queue,
            store,
            extractor: Arc::new(HeuristicExtractor::new()),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Swaps in a different extractor implementation
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Handle for requesting a cooperative stop from outside the run
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            queue: Arc::clone(&self.queue),
            stop: Arc::clone(&self.stop),
        }
    }

    /// Runs the full harvest: recover, walk listings, drain, back up
    ///
    /// The backup snapshot is written even when a phase errors, so no
    /// completed work is ever lost; the error then propagates.
    pub async fn run(&self) -> Result<HarvestSummary> {
        let started = Instant::now();

        let recovered = self.store.initialize()?;
        tracing::info!("Catalog ready with {} existing records", recovered);

        let phases_result = self.run_phases().await;

        // Best-effort snapshot regardless of how the phases ended
        if let Err(e) = self.store.backup() {
            tracing::warn!("Backup write failed: {}", e);
        }

        let listing_outcome = phases_result?;

        let stats = self.queue.stats();
        let summary = HarvestSummary {
            completed: stats.completed,
            failed: stats.failed,
            stored: self.store.len(),
            pages_visited: listing_outcome.pages_visited,
            elapsed: started.elapsed(),
            listing_aborted: listing_outcome.aborted,
        };

        tracing::info!(
            "Harvest finished in {:?}: {} completed, {} failed, {} stored",
            summary.elapsed,
            summary.completed,
            summary.failed,
            summary.stored
        );

        Ok(summary)
    }

    /// Phase 1 (listing walk) then phase 2 (queue drain)
    async fn run_phases(&self) -> Result<ListingOutcome> {
        // Listing phase: strictly sequential over its own session
        let listing_session = self.factory.new_session().await?;
        let crawler = ListingCrawler::new(
            listing_session.as_ref(),
            &self.config.search,
            self.config.delay,
            self.config.harvest.max_pages,
            self.config.harvest.retry_attempts,
        );

        let known_ids = self.store.existing_ids();
        let walk_result = crawler.walk(&self.queue, &known_ids).await;

        if let Err(e) = listing_session.close().await {
            tracing::warn!("Listing session close failed: {}", e);
        }

        let outcome = walk_result?;
        if let Some(reason) = &outcome.aborted {
            tracing::warn!(
                "Listing walk aborted ({}); harvesting the {} tasks already queued",
                reason,
                self.queue.pending_len()
            );
        }

        tracing::info!(
            "Listing phase done: {} pages, {} candidates, {} enqueued",
            outcome.pages_visited,
            outcome.candidates_seen,
            outcome.enqueued
        );
        if let Some(total) = outcome.total_listed {
            tracing::info!("Site reports {} results in total", total);
        }

        // Harvest phase: skipped entirely when nothing was enqueued
        if self.queue.pending_len() == 0 {
            tracing::info!("No new postings to harvest");
            return Ok(outcome);
        }

        if self.stop.load(Ordering::Relaxed) {
            tracing::info!("Stop requested before harvest phase, skipping");
            return Ok(outcome);
        }

        let pool = WorkerPool::new(
            Arc::clone(&self.factory),
            Arc::clone(&self.queue),
            Arc::clone(&self.store),
            Arc::clone(&self.extractor),
            self.config.delay,
            self.config.harvest.workers,
        )
        .with_stop_flag(Arc::clone(&self.stop));

        pool.run().await;

        Ok(outcome)
    }
}

/// Runs a complete harvest with the configured driver binding
///
/// This is the main library entry point:
/// 1. Build the session factory for the configured driver
/// 2. Recover the catalog from disk
/// 3. Walk the listing pages and queue new postings
/// 4. Drain the queue with the worker pool
/// 5. Write a backup snapshot and report final counts
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Final counts for the run
/// * `Err(GleanError)` - The run failed (completed work is already durable)
pub async fn run_harvest(config: Config) -> Result<HarvestSummary> {
    let factory = crate::driver::build_factory(&config.driver)?;
    let coordinator = Coordinator::new(config, factory);
    coordinator.run().await
}
