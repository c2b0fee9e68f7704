//! Single-item copy, move, and delete primitives.
//!
//! These are blocking functions; the batch scheduler runs them inside
//! `tokio::task::spawn_blocking`. Directory subtrees are walked with an
//! explicit work queue rather than recursion, so stack depth stays
//! bounded on deep trees.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use bulkfile_core::FileOperationError;

use crate::ledger::RollbackOperation;

/// Copy one entry (file or directory subtree) to `dest`.
///
/// Callers resolve name collisions before calling; `dest` is the final
/// path. Returns the rollback records for the mutation when `record`
/// is set.
pub fn copy_entry(
    source: &Path,
    dest: &Path,
    record: bool,
) -> Result<Vec<RollbackOperation>, FileOperationError> {
    if source.is_dir() {
        copy_dir_queued(source, dest)?;
    } else {
        fs::copy(source, dest).map_err(|e| FileOperationError::io(source, e))?;
    }

    let mut rollback = Vec::new();
    if record {
        // One record covers the whole subtree: undo removes `dest`.
        rollback.push(RollbackOperation::Copy {
            target: dest.to_path_buf(),
        });
    }
    Ok(rollback)
}

/// Move one entry to `dest` with a single rename.
///
/// Cross-device moves are not specially handled; the OS error surfaces
/// through the error taxonomy (typically as `Unknown`).
pub fn move_entry(
    source: &Path,
    dest: &Path,
    record: bool,
) -> Result<Vec<RollbackOperation>, FileOperationError> {
    fs::rename(source, dest).map_err(|e| FileOperationError::io(source, e))?;

    let mut rollback = Vec::new();
    if record {
        rollback.push(RollbackOperation::Move {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
        });
    }
    Ok(rollback)
}

/// Delete one entry. Files are unlinked; directories are removed with
/// their whole subtree.
///
/// With `record` set, file content is captured before the unlink so the
/// delete can be undone. Directory deletions record only the path.
pub fn delete_entry(
    source: &Path,
    record: bool,
) -> Result<Vec<RollbackOperation>, FileOperationError> {
    let mut rollback = Vec::new();

    if source.is_dir() {
        if record {
            rollback.push(RollbackOperation::Delete {
                path: source.to_path_buf(),
                content: None,
            });
        }
        delete_dir_queued(source)?;
    } else {
        if record {
            let content = fs::read(source).map_err(|e| FileOperationError::io(source, e))?;
            rollback.push(RollbackOperation::Delete {
                path: source.to_path_buf(),
                content: Some(content),
            });
        }
        fs::remove_file(source).map_err(|e| FileOperationError::io(source, e))?;
    }

    Ok(rollback)
}

/// Copy a directory subtree breadth-first via a work queue.
fn copy_dir_queued(source: &Path, dest: &Path) -> Result<(), FileOperationError> {
    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source.to_path_buf(), dest.to_path_buf()));

    while let Some((src_dir, dst_dir)) = queue.pop_front() {
        fs::create_dir_all(&dst_dir).map_err(|e| FileOperationError::io(&dst_dir, e))?;

        let entries = fs::read_dir(&src_dir).map_err(|e| FileOperationError::io(&src_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| FileOperationError::io(&src_dir, e))?;
            let path = entry.path();
            let target = dst_dir.join(entry.file_name());
            if path.is_dir() {
                queue.push_back((path, target));
            } else {
                fs::copy(&path, &target).map_err(|e| FileOperationError::io(&path, e))?;
            }
        }
    }

    Ok(())
}

/// Delete a directory subtree: files first via a work queue, then the
/// emptied directories deepest-first.
fn delete_dir_queued(root: &Path) -> Result<(), FileOperationError> {
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());
    let mut directories: Vec<PathBuf> = Vec::new();

    while let Some(dir) = queue.pop_front() {
        let entries = fs::read_dir(&dir).map_err(|e| FileOperationError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| FileOperationError::io(&dir, e))?;
            let path = entry.path();
            // Symlinks to directories are unlinked, not followed.
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                queue.push_back(path);
            } else {
                fs::remove_file(&path).map_err(|e| FileOperationError::io(&path, e))?;
            }
        }
        directories.push(dir);
    }

    for dir in directories.iter().rev() {
        fs::remove_dir(dir).map_err(|e| FileOperationError::io(dir, e))?;
    }

    Ok(())
}
