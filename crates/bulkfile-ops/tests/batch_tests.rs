use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bulkfile_core::{
    validate_file_name, ErrorKind, NameCheck, OperationClass, PathValidator, PermissionChecker,
    PermissionDecision,
};
use bulkfile_ops::{
    unique_name_in, BatchOptions, FileOperationService, SystemPathValidator,
    SystemPermissionChecker,
};
use tempfile::TempDir;

fn service() -> FileOperationService {
    FileOperationService::with_system_access()
}

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_copy_batch_into_empty_directory() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let b = write_file(&src, "b.txt", b"beta");

    let result = service()
        .copy_files_batch(&[a.clone(), b.clone()], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.successful, vec![a.clone(), b.clone()]);
    assert!(result.failed.is_empty());
    assert_eq!(result.total_processed, 2);
    assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(dst.path().join("b.txt")).unwrap(), b"beta");
    // Copy leaves the sources in place.
    assert!(a.exists());
    assert!(b.exists());
}

#[tokio::test]
async fn test_repeated_copy_renames_instead_of_overwriting() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let svc = service();

    for _ in 0..3 {
        let result = svc
            .copy_files_batch(&[a.clone()], dst.path(), BatchOptions::default())
            .await
            .unwrap();
        assert!(result.is_success());
    }

    for name in ["a.txt", "a (1).txt", "a (2).txt"] {
        assert_eq!(fs::read(dst.path().join(name)).unwrap(), b"alpha", "{name}");
    }
    assert!(!dst.path().join("a (3).txt").exists());
}

#[tokio::test]
async fn test_settled_counts_add_up() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let good1 = write_file(&src, "one.txt", b"1");
    let missing1 = src.path().join("ghost.txt");
    let good2 = write_file(&src, "two.txt", b"2");
    let missing2 = src.path().join("phantom.txt");
    let good3 = write_file(&src, "three.txt", b"3");

    let sources = vec![
        good1.clone(),
        missing1.clone(),
        good2.clone(),
        missing2,
        good3.clone(),
    ];
    let result = service()
        .copy_files_batch(
            &sources,
            dst.path(),
            BatchOptions::default().with_max_concurrency(2),
        )
        .await
        .unwrap();

    assert_eq!(result.total_processed, sources.len());
    assert_eq!(
        result.successful.len() + result.failed.len(),
        result.total_processed
    );
    assert_eq!(result.successful, vec![good1, good2, good3]);
    assert_eq!(result.failed.len(), 2);
    for failed in &result.failed {
        assert_eq!(failed.error.kind, ErrorKind::FileNotFound);
    }
}

#[tokio::test]
async fn test_delete_missing_file_records_failure() {
    let src = tempfile::tempdir().unwrap();
    let missing = src.path().join("missing.txt");

    let result = service()
        .delete_files_batch(&[missing.clone()], BatchOptions::default())
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert_eq!(result.total_processed, 1);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].path, missing);
    assert_eq!(result.failed[0].error.kind, ErrorKind::FileNotFound);
}

#[tokio::test]
async fn test_move_to_missing_destination_fails_before_touching_sources() {
    let src = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let nowhere = src.path().join("nonexistent-dir");

    let err = service()
        .move_files_batch(&[a.clone()], &nowhere, BatchOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert_eq!(err.path, nowhere);
    assert!(a.exists());
}

#[tokio::test]
async fn test_destination_must_be_a_directory() {
    let src = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let plain_file = write_file(&src, "not-a-dir", b"x");

    let err = service()
        .copy_files_batch(&[a], &plain_file, BatchOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert!(err.message.contains("not a directory"));
}

#[tokio::test]
async fn test_move_batch_renames_into_destination() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let b = write_file(&src, "b.txt", b"beta");

    let result = service()
        .move_files_batch(&[a.clone(), b.clone()], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.successful, vec![a.clone(), b.clone()]);
    assert!(!a.exists());
    assert!(!b.exists());
    assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(fs::read(dst.path().join("b.txt")).unwrap(), b"beta");
}

#[tokio::test]
async fn test_delete_directory_subtree() {
    let src = tempfile::tempdir().unwrap();
    let tree = src.path().join("tree");
    fs::create_dir_all(tree.join("nested/deeper")).unwrap();
    fs::write(tree.join("top.txt"), b"1").unwrap();
    fs::write(tree.join("nested/deeper/leaf.txt"), b"2").unwrap();
    let file = write_file(&src, "single.txt", b"3");

    let result = service()
        .delete_files_batch(&[tree.clone(), file.clone()], BatchOptions::default())
        .await
        .unwrap();

    assert!(result.is_success());
    assert!(!tree.exists());
    assert!(!file.exists());
}

#[tokio::test]
async fn test_copy_directory_batch() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let tree = src.path().join("tree");
    fs::create_dir_all(tree.join("nested")).unwrap();
    fs::write(tree.join("nested/leaf.txt"), b"leaf").unwrap();

    let result = service()
        .copy_files_batch(&[tree.clone()], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(
        fs::read(dst.path().join("tree/nested/leaf.txt")).unwrap(),
        b"leaf"
    );
    assert!(tree.exists());
}

#[tokio::test]
async fn test_rollback_restores_deleted_files_after_abort() {
    let src = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let missing = src.path().join("missing.txt");
    let c = write_file(&src, "c.txt", b"gamma");

    let svc = service();
    let err = svc
        .delete_files_batch(
            &[a.clone(), missing, c.clone()],
            BatchOptions::default()
                .abort_on_error()
                .with_rollback()
                .with_max_concurrency(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    // The completed delete of `a` was undone; `c` was never reached.
    assert_eq!(fs::read(&a).unwrap(), b"alpha");
    assert_eq!(fs::read(&c).unwrap(), b"gamma");
    assert!(svc.current_ledger().is_empty());
}

#[tokio::test]
async fn test_rollback_removes_copies_after_abort() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let missing = src.path().join("missing.txt");

    let err = service()
        .copy_files_batch(
            &[a.clone(), missing],
            dst.path(),
            BatchOptions::default()
                .abort_on_error()
                .with_rollback()
                .with_max_concurrency(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert!(!dst.path().join("a.txt").exists());
    assert!(a.exists());
}

#[tokio::test]
async fn test_rollback_moves_back_after_abort() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let missing = src.path().join("missing.txt");

    let err = service()
        .move_files_batch(
            &[a.clone(), missing],
            dst.path(),
            BatchOptions::default()
                .abort_on_error()
                .with_rollback()
                .with_max_concurrency(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert_eq!(fs::read(&a).unwrap(), b"alpha");
    assert!(!dst.path().join("a.txt").exists());
}

#[tokio::test]
async fn test_abort_drains_slice_and_rolls_back_settled_siblings() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let missing = src.path().join("missing.txt");

    // Both items share one slice; the failure aborts the batch, but the
    // sibling is never cancelled and its completed copy must be undone.
    let svc = service();
    let err = svc
        .copy_files_batch(
            &[a.clone(), missing],
            dst.path(),
            BatchOptions::default()
                .abort_on_error()
                .with_rollback()
                .with_max_concurrency(2),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert!(!dst.path().join("a.txt").exists());
    assert!(a.exists());
    assert!(svc.current_ledger().is_empty());
}

#[tokio::test]
async fn test_abort_without_rollback_keeps_completed_mutations() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let missing = src.path().join("missing.txt");

    let err = service()
        .copy_files_batch(
            &[a, missing],
            dst.path(),
            BatchOptions::default()
                .abort_on_error()
                .with_max_concurrency(1),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"alpha");
}

#[tokio::test]
async fn test_progress_reports_each_settled_item() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"1");
    let missing = src.path().join("ghost.txt");
    let c = write_file(&src, "c.txt", b"3");

    let seen: Arc<Mutex<Vec<(usize, usize, Option<PathBuf>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let result = service()
        .copy_files_batch(
            &[a.clone(), missing.clone(), c.clone()],
            dst.path(),
            BatchOptions::default()
                .with_max_concurrency(1)
                .with_progress(move |completed, total, current| {
                    sink.lock()
                        .unwrap()
                        .push((completed, total, current.map(Path::to_path_buf)));
                }),
        )
        .await
        .unwrap();

    assert_eq!(result.total_processed, 3);
    let seen = seen.lock().unwrap();
    // One callback per settled item, failures included, counter monotone.
    assert_eq!(
        *seen,
        vec![
            (1, 3, Some(a)),
            (2, 3, Some(missing)),
            (3, 3, Some(c)),
        ]
    );
}

#[tokio::test]
async fn test_invalid_source_name_is_rejected_per_item() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    // Valid on disk, but rejected by cross-platform name validation.
    let odd = write_file(&src, "trailing.", b"x");
    let fine = write_file(&src, "fine.txt", b"y");

    let result = service()
        .copy_files_batch(&[odd.clone(), fine.clone()], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(result.successful, vec![fine]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].error.kind, ErrorKind::InvalidFileName);
    assert!(odd.exists());
}

#[tokio::test]
async fn test_collision_resolved_name_is_validated() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    // 253 characters is a legal name, but its " (1)" collision variant
    // exceeds the 255-character bound.
    let long_name = "x".repeat(253);
    let long = write_file(&src, &long_name, b"first");
    fs::write(dst.path().join(&long_name), b"occupied").unwrap();

    let result = service()
        .copy_files_batch(&[long.clone()], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].error.kind, ErrorKind::InvalidFileName);
    // The occupied destination was not overwritten.
    assert_eq!(fs::read(dst.path().join(&long_name)).unwrap(), b"occupied");
}

struct PanicOnProbe;

impl PathValidator for PanicOnProbe {
    fn path_exists(&self, path: &Path) -> bool {
        if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains("boom"))
        {
            panic!("induced probe failure");
        }
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn validate_file_name(&self, name: &str) -> NameCheck {
        validate_file_name(name)
    }

    fn generate_unique_file_name(&self, dir: &Path, name: &str) -> String {
        unique_name_in(dir, name, |candidate| candidate.exists())
    }
}

#[tokio::test]
async fn test_panicking_item_still_settles_and_reports() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");
    let boom = write_file(&src, "boom.txt", b"kaboom");

    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let svc =
        FileOperationService::new(Arc::new(PanicOnProbe), Arc::new(SystemPermissionChecker));
    let result = svc
        .copy_files_batch(
            &[a.clone(), boom],
            dst.path(),
            BatchOptions::default()
                .with_max_concurrency(2)
                .with_progress(move |completed, _, _| sink.lock().unwrap().push(completed)),
        )
        .await
        .unwrap();

    // The panicking item is terminal like any other: counted, reported,
    // and recorded as failed.
    assert_eq!(result.total_processed, 2);
    assert_eq!(result.successful, vec![a]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].error.kind, ErrorKind::Unknown);

    let mut counts = seen.lock().unwrap().clone();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);
}

struct ReadOnlyPolicy;

impl PermissionChecker for ReadOnlyPolicy {
    fn check_operation_permission(
        &self,
        _path: &Path,
        class: OperationClass,
    ) -> PermissionDecision {
        match class {
            OperationClass::Read => PermissionDecision::allowed(),
            OperationClass::Write | OperationClass::Delete => {
                PermissionDecision::denied("volume is read-only")
            }
        }
    }
}

#[tokio::test]
async fn test_host_permission_policy_is_consulted() {
    let src = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");

    let svc = FileOperationService::new(Arc::new(SystemPathValidator), Arc::new(ReadOnlyPolicy));
    let result = svc
        .delete_files_batch(&[a.clone()], BatchOptions::default())
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert_eq!(result.failed[0].error.kind, ErrorKind::PermissionDenied);
    assert!(result.failed[0]
        .error
        .message
        .contains("read-only"));
    assert!(a.exists());
}

#[tokio::test]
async fn test_concurrent_slices_preserve_source_order() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let sources: Vec<PathBuf> = (0..10)
        .map(|i| write_file(&src, &format!("file-{i:02}.txt"), format!("{i}").as_bytes()))
        .collect();

    let result = service()
        .copy_files_batch(
            &sources,
            dst.path(),
            BatchOptions::default().with_max_concurrency(4),
        )
        .await
        .unwrap();

    assert_eq!(result.successful, sources);
    assert_eq!(result.total_processed, 10);
    for i in 0..10 {
        assert!(dst.path().join(format!("file-{i:02}.txt")).exists());
    }
}

#[tokio::test]
async fn test_ledger_is_inspectable_between_runs() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let a = write_file(&src, "a.txt", b"alpha");

    let svc = service();
    let result = svc
        .copy_files_batch(
            &[a],
            dst.path(),
            BatchOptions::default().with_rollback(),
        )
        .await
        .unwrap();

    assert!(result.is_success());
    // Records from the completed run stay visible for diagnostics
    // until the next run starts or they are cleared explicitly.
    assert_eq!(svc.current_ledger().len(), 1);
    svc.clear_ledger();
    assert!(svc.current_ledger().is_empty());
}

#[tokio::test]
async fn test_empty_source_list_is_a_clean_noop() {
    let dst = tempfile::tempdir().unwrap();

    let result = service()
        .copy_files_batch(&[], dst.path(), BatchOptions::default())
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert!(result.failed.is_empty());
    assert_eq!(result.total_processed, 0);
}
