//! Options and result types for batch operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bulkfile_core::FileOperationError;

use crate::DEFAULT_MAX_CONCURRENCY;

/// Callback invoked once per item as it reaches a terminal state.
///
/// Arguments are `(completed_count, total_count, current_item)`. The
/// completed count is monotonically increasing across the whole batch;
/// within a slice the invocation order follows completion, not the
/// source list.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, Option<&Path>) + Send + Sync>;

/// Options controlling one batch call.
#[derive(Clone)]
pub struct BatchOptions {
    /// Keep processing remaining items after a per-item failure.
    pub continue_on_error: bool,
    /// Record completed mutations for replay if the batch aborts.
    pub enable_rollback: bool,
    /// Maximum number of items in flight at once.
    pub max_concurrency: usize,
    /// Optional per-item progress sink.
    pub progress: Option<ProgressCallback>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            enable_rollback: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            progress: None,
        }
    }
}

impl BatchOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the batch on the first per-item failure.
    pub fn abort_on_error(mut self) -> Self {
        self.continue_on_error = false;
        self
    }

    /// Record completed mutations and replay them on abort.
    pub fn with_rollback(mut self) -> Self {
        self.enable_rollback = true;
        self
    }

    /// Set the slice size. Clamped to at least 1.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Set the progress callback.
    pub fn with_progress(
        mut self,
        callback: impl Fn(usize, usize, Option<&Path>) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOptions")
            .field("continue_on_error", &self.continue_on_error)
            .field("enable_rollback", &self.enable_rollback)
            .field("max_concurrency", &self.max_concurrency)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A source path that failed, with the error that settled it.
#[derive(Debug)]
pub struct FailedItem {
    /// The source path.
    pub path: PathBuf,
    /// Why it failed.
    pub error: FileOperationError,
}

/// Aggregate outcome of a batch that ran to completion.
///
/// For a run that does not abort,
/// `successful.len() + failed.len() == total_processed == sources.len()`.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Source paths that completed, in source-list order.
    pub successful: Vec<PathBuf>,
    /// Items that failed, with their errors.
    pub failed: Vec<FailedItem>,
    /// Number of items that reached a terminal state.
    pub total_processed: usize,
}

impl BatchResult {
    /// Whether every item completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("Processed {} items", self.total_processed)
        } else {
            format!(
                "Processed {} items, {} failed",
                self.total_processed,
                self.failed.len()
            )
        }
    }
}
