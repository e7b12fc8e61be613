//! Four-partition task queue with dedup and bounded retries
//!
//! This module owns work distribution for the harvest phase:
//! - FIFO pending queue seeded by the listing walk
//! - Processing set of tasks currently held by workers
//! - Terminal completed/failed sets
//! - Dedup across all four partitions
//! - Retry-with-requeue bounded by a configurable attempt limit
//!
//! A given task id lives in exactly one partition at any instant. All
//! transitions happen under a single mutex so that a task is never handed
//! to two workers, and callers observe progress by polling `stats()`.

use crate::queue::task::{HarvestTask, TaskState};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Default number of processing attempts before permanent failure
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Snapshot of per-partition counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub paused: bool,
}

/// The four partitions plus the dedup index, guarded as one unit
struct QueueInner {
    pending: VecDeque<HarvestTask>,
    processing: HashMap<String, HarvestTask>,
    completed: HashMap<String, HarvestTask>,
    failed: HashMap<String, HarvestTask>,
    /// Union of all partition ids, for O(1) dedup
    known: HashSet<String>,
    paused: bool,
}

/// Work queue shared between the listing walk and the worker pool
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
    retry_limit: u32,
}

impl TaskQueue {
    /// Creates an empty queue with the given retry limit
    pub fn new(retry_limit: u32) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                processing: HashMap::new(),
                completed: HashMap::new(),
                failed: HashMap::new(),
                known: HashSet::new(),
                paused: false,
            }),
            retry_limit,
        }
    }

    /// Adds a task to the pending partition
    ///
    /// Returns false without inserting when the id is already known to any
    /// partition. Completed and failed are terminal within a run, so a
    /// resolved id cannot be re-enqueued.
    pub fn enqueue(&self, task: HarvestTask) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if inner.known.contains(&task.id) {
            tracing::debug!("Skipping duplicate task {}", task.id);
            return false;
        }

        inner.known.insert(task.id.clone());
        inner.pending.push_back(task);
        true
    }

    /// Enqueues a batch of tasks, returning how many were actually added
    pub fn enqueue_batch(&self, tasks: Vec<HarvestTask>) -> usize {
        tasks
            .into_iter()
            .map(|t| self.enqueue(t))
            .filter(|added| *added)
            .count()
    }

    /// Number of tasks waiting in the pending partition
    pub fn pending_len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    /// Hands the head of the pending queue to a worker
    ///
    /// Returns None while paused or when pending is empty. The attempt
    /// counter, start timestamp, and move into processing happen under the
    /// same lock, so no task is ever visible to two workers.
    pub fn dequeue(&self) -> Option<HarvestTask> {
        let mut inner = self.inner.lock().unwrap();

        if inner.paused {
            return None;
        }

        let mut task = inner.pending.pop_front()?;
        task.attempts += 1;
        task.state = TaskState::Processing;
        task.started_at = Some(chrono::Utc::now().to_rfc3339());

        inner.processing.insert(task.id.clone(), task.clone());
        Some(task)
    }

    /// Moves a task from processing to completed
    ///
    /// Returns false when the id is not currently processing.
    pub fn complete(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();

        match inner.processing.remove(id) {
            Some(mut task) => {
                task.state = TaskState::Completed;
                task.completed_at = Some(chrono::Utc::now().to_rfc3339());
                inner.completed.insert(task.id.clone(), task);
                true
            }
            None => false,
        }
    }

    /// Records a failed attempt for a processing task
    ///
    /// Retryable failures below the retry limit go back to the FRONT of
    /// pending, keeping their id and accumulated attempt count; retried
    /// pages are prioritized over untried work. Everything else lands in
    /// the failed partition permanently.
    ///
    /// Returns false when the id is not currently processing.
    pub fn fail(&self, id: &str, error: &str, retryable: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();

        let Some(mut task) = inner.processing.remove(id) else {
            return false;
        };

        task.last_error = Some(error.to_string());

        if retryable && task.attempts < self.retry_limit {
            tracing::info!(
                "Retrying task {} (attempt {}/{}): {}",
                task.id,
                task.attempts,
                self.retry_limit,
                error
            );
            task.state = TaskState::Pending;
            inner.pending.push_front(task);
        } else {
            tracing::warn!(
                "Task {} failed permanently after {} attempts: {}",
                task.id,
                task.attempts,
                error
            );
            task.state = TaskState::Failed;
            task.failed_at = Some(chrono::Utc::now().to_rfc3339());
            inner.failed.insert(task.id.clone(), task);
        }

        true
    }

    /// True when both pending and processing are empty
    ///
    /// This is the sole termination condition for the harvest phase.
    pub fn is_drained(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.pending.is_empty() && inner.processing.is_empty()
    }

    /// Stops dequeue from yielding work; in-flight tasks are unaffected
    pub fn pause(&self) {
        self.inner.lock().unwrap().paused = true;
    }

    /// Resumes dequeue after a pause
    pub fn resume(&self) {
        self.inner.lock().unwrap().paused = false;
    }

    /// Snapshot of per-partition counts and the paused flag
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().unwrap();
        QueueStats {
            pending: inner.pending.len(),
            processing: inner.processing.len(),
            completed: inner.completed.len(),
            failed: inner.failed.len(),
            paused: inner.paused,
        }
    }

    /// Looks up a resolved task by id (completed or failed)
    pub fn resolved(&self, id: &str) -> Option<HarvestTask> {
        let inner = self.inner.lock().unwrap();
        inner
            .completed
            .get(id)
            .or_else(|| inner.failed.get(id))
            .cloned()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_LIMIT)
    }
}
