//! Batch scheduler: slice-partitioned, bounded-concurrency execution.
//!
//! A batch partitions its source list into contiguous slices of at most
//! `max_concurrency` items. Slices run strictly in order; within a
//! slice every item is dispatched at once and the scheduler waits for
//! the whole slice to settle before starting the next one. This is a
//! barrier-synchronized pool, not a continuously refilled one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use bulkfile_core::{
    ErrorKind, FileOperationError, OperationClass, PathValidator, PermissionChecker,
};

use crate::access::{SystemPathValidator, SystemPermissionChecker};
use crate::executor;
use crate::gate::ValidationGate;
use crate::ledger::{self, RollbackLedger, RollbackOperation};
use crate::options::{BatchOptions, BatchResult, FailedItem};

/// Which batch entry point is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Copy,
    Move,
    Delete,
}

impl BatchKind {
    /// The access class required on each source path.
    fn source_class(self) -> OperationClass {
        match self {
            Self::Copy => OperationClass::Read,
            Self::Move | Self::Delete => OperationClass::Delete,
        }
    }
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Batch file operation service.
///
/// Owned by a composition root and constructed explicitly; there is no
/// global registration. The service holds the rollback ledger for the
/// duration of one batch call and exposes it for diagnostics between
/// calls.
pub struct FileOperationService {
    validator: Arc<dyn PathValidator>,
    gate: ValidationGate,
    ledger: Mutex<RollbackLedger>,
}

impl FileOperationService {
    /// Create a service over the given collaborators.
    pub fn new(
        validator: Arc<dyn PathValidator>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        let gate = ValidationGate::new(Arc::clone(&validator), permissions);
        Self {
            validator,
            gate,
            ledger: Mutex::new(RollbackLedger::new()),
        }
    }

    /// Create a service over the filesystem-backed defaults.
    pub fn with_system_access() -> Self {
        Self::new(
            Arc::new(SystemPathValidator),
            Arc::new(SystemPermissionChecker),
        )
    }

    /// Copy `sources` into `destination`.
    ///
    /// The destination must already exist and be a writable directory;
    /// that is checked before any item starts. Occupied destination
    /// names are resolved with a `(1)`-style suffix, never overwritten.
    pub async fn copy_files_batch(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        options: BatchOptions,
    ) -> Result<BatchResult, FileOperationError> {
        self.gate.check_destination(destination)?;
        self.run_batch(BatchKind::Copy, sources, Some(destination), options)
            .await
    }

    /// Move `sources` into `destination`. Same preconditions and
    /// collision handling as [`copy_files_batch`](Self::copy_files_batch).
    pub async fn move_files_batch(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        options: BatchOptions,
    ) -> Result<BatchResult, FileOperationError> {
        self.gate.check_destination(destination)?;
        self.run_batch(BatchKind::Move, sources, Some(destination), options)
            .await
    }

    /// Delete `sources`. Directories are removed with their subtrees.
    pub async fn delete_files_batch(
        &self,
        sources: &[PathBuf],
        options: BatchOptions,
    ) -> Result<BatchResult, FileOperationError> {
        self.run_batch(BatchKind::Delete, sources, None, options).await
    }

    /// Snapshot of the current rollback ledger, for diagnostics.
    pub fn current_ledger(&self) -> Vec<RollbackOperation> {
        self.ledger_guard().entries().to_vec()
    }

    /// Explicitly drop any retained ledger entries.
    pub fn clear_ledger(&self) {
        self.ledger_guard().clear();
    }

    fn ledger_guard(&self) -> MutexGuard<'_, RollbackLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_batch(
        &self,
        kind: BatchKind,
        sources: &[PathBuf],
        destination: Option<&Path>,
        options: BatchOptions,
    ) -> Result<BatchResult, FileOperationError> {
        // Fresh ledger per run; entries from the previous run are only
        // retained until the next batch starts.
        self.ledger_guard().clear();

        let total = sources.len();
        let max = options.max_concurrency.max(1);
        debug!(%kind, items = total, max_concurrency = max, "starting batch");

        let mut result = BatchResult::default();
        let mut completed = 0usize;
        let mut abort_error: Option<FileOperationError> = None;

        for slice in sources.chunks(max) {
            let mut tasks: JoinSet<(usize, Result<Vec<RollbackOperation>, FileOperationError>)> =
                JoinSet::new();

            for (idx, source) in slice.iter().enumerate() {
                let source = source.clone();
                let destination = destination.map(Path::to_path_buf);
                let gate = self.gate.clone();
                let validator = Arc::clone(&self.validator);
                let record = options.enable_rollback;
                tasks.spawn(async move {
                    let outcome =
                        run_item(kind, &source, destination, gate, validator, record).await;
                    (idx, outcome)
                });
            }

            let mut slots: Vec<Option<Result<(), FileOperationError>>> =
                (0..slice.len()).map(|_| None).collect();

            // Drain the whole slice even after a failure: launched
            // siblings are never cancelled, and their mutations must be
            // ledgered before any rollback begins.
            while let Some(joined) = tasks.join_next().await {
                let (idx, outcome) = match joined {
                    Ok(settled) => settled,
                    Err(join_error) => {
                        // The item is terminal even though we cannot tell
                        // which slot it was; it still counts and reports.
                        warn!(error = %join_error, "item task did not settle cleanly");
                        completed += 1;
                        if let Some(callback) = &options.progress {
                            callback.as_ref()(completed, total, None);
                        }
                        if !options.continue_on_error && abort_error.is_none() {
                            abort_error = Some(FileOperationError::new(
                                ErrorKind::Unknown,
                                PathBuf::new(),
                                format!("item task failed: {join_error}"),
                            ));
                        }
                        continue;
                    }
                };

                completed += 1;
                if let Some(callback) = &options.progress {
                    callback.as_ref()(completed, total, Some(&slice[idx]));
                }

                match outcome {
                    Ok(rollback_ops) => {
                        if options.enable_rollback && !rollback_ops.is_empty() {
                            let mut ledger = self.ledger_guard();
                            for op in rollback_ops {
                                ledger.record(op);
                            }
                        }
                        slots[idx] = Some(Ok(()));
                    }
                    Err(error) => {
                        if options.continue_on_error {
                            slots[idx] = Some(Err(error));
                        } else if abort_error.is_none() {
                            warn!(%kind, path = %slice[idx].display(), error = %error,
                                "item failed, aborting batch");
                            abort_error = Some(error);
                        } else {
                            debug!(path = %slice[idx].display(), error = %error,
                                "additional failure while draining aborted slice");
                        }
                    }
                }
            }

            if let Some(error) = abort_error.take() {
                if options.enable_rollback {
                    let entries = self.ledger_guard().take();
                    let report = ledger::replay(entries).await;
                    info!(undone = report.undone, failed = report.failed,
                        "rolled back after abort");
                }
                return Err(error);
            }

            for (idx, slot) in slots.into_iter().enumerate() {
                let outcome = slot.unwrap_or_else(|| {
                    Err(FileOperationError::new(
                        ErrorKind::Unknown,
                        slice[idx].clone(),
                        "item task did not settle",
                    ))
                });
                result.total_processed += 1;
                match outcome {
                    Ok(()) => result.successful.push(slice[idx].clone()),
                    Err(error) => result.failed.push(FailedItem {
                        path: slice[idx].clone(),
                        error,
                    }),
                }
            }
        }

        debug!(%kind, succeeded = result.successful.len(), failed = result.failed.len(),
            "batch finished");
        Ok(result)
    }
}

/// Run one item to a terminal state: validate, resolve any name
/// collision, mutate, and report the rollback records produced.
async fn run_item(
    kind: BatchKind,
    source: &Path,
    destination: Option<PathBuf>,
    gate: ValidationGate,
    validator: Arc<dyn PathValidator>,
    record: bool,
) -> Result<Vec<RollbackOperation>, FileOperationError> {
    gate.check_source(source, kind.source_class())?;

    // Delete never renames; copy/move resolve the final name up front.
    let dest_path = match destination {
        Some(dir) => {
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .ok_or_else(|| {
                    FileOperationError::invalid_name(source, "source has no usable file name")
                })?;
            gate.check_name(source, &name)?;
            let unique = validator.generate_unique_file_name(&dir, &name);
            // Collision resolution can alter the candidate name; the
            // name actually written to disk is the one that must pass.
            if unique != name {
                gate.check_name(source, &unique)?;
            }
            Some(dir.join(unique))
        }
        None => None,
    };

    let source_owned = source.to_path_buf();
    let joined = tokio::task::spawn_blocking(move || match (kind, dest_path) {
        (BatchKind::Delete, _) => executor::delete_entry(&source_owned, record),
        (BatchKind::Copy, Some(dest)) => executor::copy_entry(&source_owned, &dest, record),
        (BatchKind::Move, Some(dest)) => executor::move_entry(&source_owned, &dest, record),
        (_, None) => Err(FileOperationError::new(
            ErrorKind::Unknown,
            &source_owned,
            "copy/move dispatched without a destination",
        )),
    })
    .await;

    match joined {
        Ok(outcome) => outcome,
        Err(join_error) => Err(FileOperationError::new(
            ErrorKind::Unknown,
            source,
            format!("operation task failed: {join_error}"),
        )),
    }
}
