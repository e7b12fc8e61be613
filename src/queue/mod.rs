//! Task queue for harvest work distribution
//!
//! This module contains the harvest task descriptor and the four-partition
//! queue that feeds the worker pool, including:
//! - Dedup across pending/processing/completed/failed
//! - FIFO dispatch with retries re-inserted at the front
//! - Bounded retry accounting
//! - Pause/resume and drain detection

mod queue;
mod task;

pub use queue::{QueueStats, TaskQueue, DEFAULT_RETRY_LIMIT};
pub use task::{HarvestTask, TaskState};
