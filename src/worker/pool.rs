//! Bounded pool of detail-page workers
//!
//! Each worker is an independent tokio task that owns a private driver
//! session for its whole lifetime. Workers pull from the shared queue,
//! fetch and extract one detail page at a time, persist the result, and
//! report the outcome back to the queue. The pool resolves once every
//! worker has exited, which happens only when the queue is drained or a
//! stop was requested.

use crate::config::DelayConfig;
use crate::driver::{PageSession, SessionFactory};
use crate::extract::{merge_preview, Extractor};
use crate::queue::{HarvestTask, TaskQueue};
use crate::store::CatalogStore;
use crate::GleanError;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long an idle worker waits before re-checking the queue
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fixed-size pool of fetch-and-extract workers
pub struct WorkerPool {
    factory: Arc<dyn SessionFactory>,
    queue: Arc<TaskQueue>,
    store: Arc<CatalogStore>,
    extractor: Arc<dyn Extractor>,
    delay: DelayConfig,
    workers: u32,
    stop: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        queue: Arc<TaskQueue>,
        store: Arc<CatalogStore>,
        extractor: Arc<dyn Extractor>,
        delay: DelayConfig,
        workers: u32,
    ) -> Self {
        Self {
            factory,
            queue,
            store,
            extractor,
            delay,
            workers,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the pool's stop flag with a shared one
    ///
    /// Lets an orchestrator wire one stop signal through the queue and the
    /// pool together.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Signals every worker to exit after its current task
    ///
    /// Cooperative: in-flight fetches finish (or fail) before the worker
    /// checks the flag again.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Shareable handle for stopping the pool from outside
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Launches all workers and resolves when every one has exited
    pub async fn run(&self) {
        tracing::info!("Starting {} harvest workers", self.workers);

        let mut handles = Vec::new();
        for worker_id in 0..self.workers {
            let factory = Arc::clone(&self.factory);
            let queue = Arc::clone(&self.queue);
            let store = Arc::clone(&self.store);
            let extractor = Arc::clone(&self.extractor);
            let stop = Arc::clone(&self.stop);
            let delay = self.delay;

            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, factory, queue, store, extractor, delay, stop).await;
            }));
        }

        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!("Worker {} panicked: {}", worker_id, e);
            }
        }

        let stats = self.queue.stats();
        tracing::info!(
            "All workers exited: {} completed, {} failed",
            stats.completed,
            stats.failed
        );
    }
}

/// One worker's whole lifetime: acquire a session, drain the queue, release
///
/// The session is closed on every exit path; close errors are logged and
/// swallowed so cleanup never cascades.
async fn worker_loop(
    worker_id: u32,
    factory: Arc<dyn SessionFactory>,
    queue: Arc<TaskQueue>,
    store: Arc<CatalogStore>,
    extractor: Arc<dyn Extractor>,
    delay: DelayConfig,
    stop: Arc<AtomicBool>,
) {
    let session = match factory.new_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Worker {} could not open a session: {}", worker_id, e);
            return;
        }
    };

    tracing::debug!("Worker {} started", worker_id);

    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!("Worker {} stopping on request", worker_id);
            break;
        }

        let Some(task) = queue.dequeue() else {
            if queue.is_drained() {
                tracing::debug!("Worker {} found the queue drained, exiting", worker_id);
                break;
            }
            // Other workers still hold tasks that may be retried
            tokio::time::sleep(POLL_INTERVAL).await;
            continue;
        };

        tracing::debug!(
            "Worker {} processing {} (attempt {})",
            worker_id,
            task.id,
            task.attempts
        );

        match process_task(session.as_ref(), extractor.as_ref(), &store, &task).await {
            Ok(stored) => {
                queue.complete(&task.id);
                if stored {
                    tracing::info!("Worker {} harvested {}", worker_id, task.id);
                } else {
                    tracing::info!(
                        "Worker {} found {} already stored, counted as complete",
                        worker_id,
                        task.id
                    );
                }
            }
            Err(e) => {
                // Every per-task failure is retryable up to the queue's limit
                queue.fail(&task.id, &e.to_string(), true);
            }
        }

        inter_request_delay(delay).await;
    }

    if let Err(e) = session.close().await {
        tracing::warn!("Worker {} session close failed: {}", worker_id, e);
    }
    tracing::debug!("Worker {} exited", worker_id);
}

/// Fetches, extracts, merges, and persists one posting
///
/// Returns whether the posting was newly stored (false = deduplicated).
async fn process_task(
    session: &dyn PageSession,
    extractor: &dyn Extractor,
    store: &CatalogStore,
    task: &HarvestTask,
) -> Result<bool, GleanError> {
    session.open(&task.url).await?;
    session.wait_until_stable().await?;
    let content = session.content().await?;

    let extracted = extractor.extract(&content, &task.url);
    let mut posting = merge_preview(extracted, &task.preview);
    // The queue id is the dedup key; the extractor's guess must not diverge
    posting.id = task.id.clone();

    Ok(store.add(posting)?)
}

/// Randomized politeness delay after each task, success or failure
async fn inter_request_delay(delay: DelayConfig) {
    let ms = rand::rng().random_range(delay.min_ms..=delay.max_ms);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverError, DriverResult, PageElement};
    use crate::extract::HeuristicExtractor;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted driver: canned bodies per URL plus per-URL failure budgets
    struct ScriptedFactory {
        pages: Arc<HashMap<String, String>>,
        failures: Arc<Mutex<HashMap<String, u32>>>,
    }

    impl ScriptedFactory {
        fn new(pages: HashMap<String, String>) -> Self {
            Self {
                pages: Arc::new(pages),
                failures: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        fn fail_first(self, url: &str, times: u32) -> Self {
            self.failures.lock().unwrap().insert(url.to_string(), times);
            self
        }
    }

    #[async_trait]
    impl SessionFactory for ScriptedFactory {
        async fn new_session(&self) -> DriverResult<Box<dyn PageSession>> {
            Ok(Box::new(ScriptedSession {
                pages: Arc::clone(&self.pages),
                failures: Arc::clone(&self.failures),
                current: Mutex::new(None),
            }))
        }
    }

    struct ScriptedSession {
        pages: Arc<HashMap<String, String>>,
        failures: Arc<Mutex<HashMap<String, u32>>>,
        current: Mutex<Option<String>>,
    }

    #[async_trait]
    impl PageSession for ScriptedSession {
        async fn open(&self, url: &str) -> DriverResult<()> {
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(url) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(DriverError::Navigation {
                            url: url.to_string(),
                            message: "scripted failure".to_string(),
                        });
                    }
                }
            }

            if !self.pages.contains_key(url) {
                return Err(DriverError::Navigation {
                    url: url.to_string(),
                    message: "HTTP 404".to_string(),
                });
            }

            *self.current.lock().unwrap() = Some(url.to_string());
            Ok(())
        }

        async fn wait_until_stable(&self) -> DriverResult<()> {
            Ok(())
        }

        async fn content(&self) -> DriverResult<String> {
            let current = self.current.lock().unwrap();
            current
                .as_ref()
                .and_then(|url| self.pages.get(url).cloned())
                .ok_or_else(|| DriverError::Session("no page opened".to_string()))
        }

        async fn query_all(&self, _selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
            Ok(Vec::new())
        }

        async fn close(&self) -> DriverResult<()> {
            Ok(())
        }
    }

    fn detail_page(title: &str) -> String {
        format!(
            r#"<html><body><h1 class="job-title">{}</h1><div class="company-name">Acme</div></body></html>"#,
            title
        )
    }

    fn no_delay() -> DelayConfig {
        DelayConfig { min_ms: 0, max_ms: 0 }
    }

    fn seeded_queue(ids: &[&str]) -> Arc<TaskQueue> {
        let queue = Arc::new(TaskQueue::new(3));
        for id in ids {
            queue.enqueue(HarvestTask::new(
                *id,
                format!("https://jobs.example.com/jobs/{}", id),
            ));
        }
        queue
    }

    fn pages_for(ids: &[&str]) -> HashMap<String, String> {
        ids.iter()
            .map(|id| {
                (
                    format!("https://jobs.example.com/jobs/{}", id),
                    detail_page(&format!("Job {}", id)),
                )
            })
            .collect()
    }

    async fn run_pool(
        factory: ScriptedFactory,
        queue: Arc<TaskQueue>,
        workers: u32,
    ) -> (Arc<TaskQueue>, Arc<CatalogStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CatalogStore::new(dir.path().join("catalog.json")));
        store.initialize().unwrap();

        let pool = WorkerPool::new(
            Arc::new(factory),
            Arc::clone(&queue),
            Arc::clone(&store),
            Arc::new(HeuristicExtractor::new()),
            no_delay(),
            workers,
        );
        pool.run().await;

        (queue, store, dir)
    }

    #[tokio::test]
    async fn test_two_workers_drain_five_tasks() {
        let ids = ["j-1", "j-2", "j-3", "j-4", "j-5"];
        let queue = seeded_queue(&ids);
        let factory = ScriptedFactory::new(pages_for(&ids));

        let (queue, store, _dir) = run_pool(factory, queue, 2).await;

        let stats = queue.stats();
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.failed, 0);
        assert!(queue.is_drained());
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_task_succeeds_on_third_attempt() {
        let ids = ["j-x"];
        let queue = seeded_queue(&ids);
        let factory =
            ScriptedFactory::new(pages_for(&ids)).fail_first("https://jobs.example.com/jobs/j-x", 2);

        let (queue, store, _dir) = run_pool(factory, queue, 1).await;

        let resolved = queue.resolved("j-x").unwrap();
        assert_eq!(resolved.state, crate::queue::TaskState::Completed);
        assert_eq!(resolved.attempts, 3);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_task_fails_permanently_after_retry_limit() {
        let ids = ["j-y"];
        let queue = seeded_queue(&ids);
        let factory =
            ScriptedFactory::new(pages_for(&ids)).fail_first("https://jobs.example.com/jobs/j-y", 99);

        let (queue, store, _dir) = run_pool(factory, queue, 1).await;

        let resolved = queue.resolved("j-y").unwrap();
        assert_eq!(resolved.state, crate::queue::TaskState::Failed);
        assert_eq!(resolved.attempts, 3);
        assert_eq!(store.len(), 0);
        assert!(queue.is_drained());
    }

    #[tokio::test]
    async fn test_preview_fallback_applies() {
        let queue = Arc::new(TaskQueue::new(3));
        let mut preview = HashMap::new();
        preview.insert("location".to_string(), "Berlin".to_string());
        queue.enqueue(
            HarvestTask::new("j-p", "https://jobs.example.com/jobs/j-p").with_preview(preview),
        );

        // Detail page has no location, so the preview value must win
        let factory = ScriptedFactory::new(pages_for(&["j-p"]));
        let (_queue, store, _dir) = run_pool(factory, queue, 1).await;

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "Berlin");
        assert_eq!(records[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_stop_prevents_new_work() {
        let ids = ["j-1", "j-2", "j-3"];
        let queue = seeded_queue(&ids);
        let factory = ScriptedFactory::new(pages_for(&ids));

        let dir = TempDir::new().unwrap();
        let store = Arc::new(CatalogStore::new(dir.path().join("catalog.json")));
        store.initialize().unwrap();

        let pool = WorkerPool::new(
            Arc::new(factory),
            Arc::clone(&queue),
            Arc::clone(&store),
            Arc::new(HeuristicExtractor::new()),
            no_delay(),
            1,
        );
        pool.stop();
        pool.run().await;

        // Stopped before any dequeue: nothing processed, nothing lost
        let stats = queue.stats();
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 3);
    }
}
