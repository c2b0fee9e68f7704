//! Rollback ledger for batch operations.
//!
//! The ledger is an append-only record of completed mutations for one
//! batch run. On abort it replays in strict reverse (LIFO) order. Each
//! undo step is best-effort: a failing step is logged and counted but
//! never stops the remaining steps, and replay never produces an error
//! that could shadow the one that triggered the abort.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A completed mutation that can be undone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RollbackOperation {
    /// An entry was created; undo removes it.
    Create {
        /// The created path.
        path: PathBuf,
    },
    /// An entry was deleted; undo rewrites the captured content.
    ///
    /// Content is captured for files only. Directory deletions record
    /// just the path, so their undo restores nothing and still counts
    /// as attempted. This is a documented limitation of the engine,
    /// not a bug to fix with a subtree snapshot.
    Delete {
        /// The deleted path.
        path: PathBuf,
        /// Raw bytes of the deleted file, `None` for directories.
        content: Option<Vec<u8>>,
    },
    /// An entry was renamed; undo renames it back.
    Move {
        /// The original path.
        from: PathBuf,
        /// Where it ended up.
        to: PathBuf,
    },
    /// An entry was copied; undo removes the copy.
    Copy {
        /// The created copy (file or directory subtree).
        target: PathBuf,
    },
}

/// Outcome of a replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Undo steps that completed (including directory-delete no-ops).
    pub undone: usize,
    /// Undo steps that failed and were skipped.
    pub failed: usize,
}

/// Append-only undo log for one batch run.
///
/// Entries are appended in the order mutations complete, which within a
/// slice is not necessarily source-list order.
#[derive(Debug, Default)]
pub struct RollbackLedger {
    entries: Vec<RollbackOperation>,
}

impl RollbackLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for a mutation that just completed.
    pub fn record(&mut self, operation: RollbackOperation) {
        self.entries.push(operation);
    }

    /// The recorded entries, oldest first.
    pub fn entries(&self) -> &[RollbackOperation] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return all entries, leaving the ledger empty.
    pub fn take(&mut self) -> Vec<RollbackOperation> {
        std::mem::take(&mut self.entries)
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Replay recorded mutations in reverse order, best-effort.
///
/// Failures are logged and counted; the report never carries an error.
pub async fn replay(entries: Vec<RollbackOperation>) -> ReplayReport {
    tokio::task::spawn_blocking(move || replay_blocking(entries))
        .await
        .unwrap_or_default()
}

fn replay_blocking(entries: Vec<RollbackOperation>) -> ReplayReport {
    let mut report = ReplayReport::default();
    for operation in entries.into_iter().rev() {
        match undo_one(&operation) {
            Ok(()) => report.undone += 1,
            Err(e) => {
                warn!(?operation, error = %e, "undo step failed, continuing");
                report.failed += 1;
            }
        }
    }
    report
}

fn undo_one(operation: &RollbackOperation) -> std::io::Result<()> {
    match operation {
        RollbackOperation::Create { path } | RollbackOperation::Copy { target: path } => {
            remove_entry(path)
        }
        RollbackOperation::Delete { path, content } => match content {
            Some(bytes) => fs::write(path, bytes),
            // Directory content was never captured; nothing to restore.
            None => Ok(()),
        },
        RollbackOperation::Move { from, to } => fs::rename(to, from),
    }
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
