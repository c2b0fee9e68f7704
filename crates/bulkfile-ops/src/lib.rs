//! Batch file operations engine for bulkfile.
//!
//! This crate provides bulk copy, move, and delete over sets of files
//! and directories with bounded concurrency, partial-failure handling,
//! and best-effort rollback of completed mutations when a batch aborts.

mod access;
mod batch;
mod executor;
mod gate;
mod ledger;
mod naming;
mod options;

pub use access::{SystemPathValidator, SystemPermissionChecker};
pub use batch::{BatchKind, FileOperationService};
pub use executor::{copy_entry, delete_entry, move_entry};
pub use gate::ValidationGate;
pub use ledger::{replay, ReplayReport, RollbackLedger, RollbackOperation};
pub use naming::unique_name_in;
pub use options::{BatchOptions, BatchResult, FailedItem, ProgressCallback};

/// Default number of items dispatched concurrently within one slice.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
