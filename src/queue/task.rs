/// Task state definitions for tracking harvest progress
///
/// This module defines the states a harvest task moves through between
/// discovery on a listing page and permanent resolution.
use std::collections::HashMap;
use std::fmt;

/// Represents the current state of a harvest task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Task is waiting in the pending queue
    Pending,

    /// Task has been handed to a worker
    Processing,

    /// Detail page was fetched, extracted, and persisted
    Completed,

    /// Task exhausted its retry budget
    Failed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the task may still be processed
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// String representation used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a task state from its string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detail-page fetch discovered on a listing page
///
/// The id is stable across runs and is the dedup key for both the queue
/// and the catalog store. Preview fields hold whatever the listing card
/// exposed (title, company, location, ...) and serve as fallbacks when
/// detail extraction comes up empty.
#[derive(Debug, Clone)]
pub struct HarvestTask {
    /// Stable identifier, unique across runs
    pub id: String,

    /// Detail page URL
    pub url: String,

    /// Best-effort fields scraped from the listing card
    pub preview: HashMap<String, String>,

    /// Number of processing attempts so far
    pub attempts: u32,

    /// Current partition
    pub state: TaskState,

    /// RFC 3339 timestamp of enqueue
    pub added_at: String,

    /// RFC 3339 timestamp of the most recent dequeue
    pub started_at: Option<String>,

    /// RFC 3339 timestamp of successful completion
    pub completed_at: Option<String>,

    /// RFC 3339 timestamp of permanent failure
    pub failed_at: Option<String>,

    /// Most recent error message, if any attempt failed
    pub last_error: Option<String>,
}

impl HarvestTask {
    /// Creates a new pending task with zero attempts
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            preview: HashMap::new(),
            attempts: 0,
            state: TaskState::Pending,
            added_at: chrono::Utc::now().to_rfc3339(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            last_error: None,
        }
    }

    /// Attaches preview fields scraped from the listing card
    pub fn with_preview(mut self, preview: HashMap<String, String>) -> Self {
        self.preview = preview;
        self
    }
}
