//! Filesystem-backed defaults for the collaborator traits.
//!
//! Host applications with their own sandboxing or mount policy supply
//! their own implementations; these defaults answer from the local
//! filesystem so the engine is usable standalone and in tests.

use std::fs;
use std::path::Path;

use bulkfile_core::{
    validate_file_name, NameCheck, OperationClass, PathValidator, PermissionChecker,
    PermissionDecision,
};

use crate::naming::unique_name_in;

/// [`PathValidator`] answering from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPathValidator;

impl PathValidator for SystemPathValidator {
    fn path_exists(&self, path: &Path) -> bool {
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

/// [`PermissionChecker`] answering from filesystem metadata.
///
/// This checks the read-only bit and basic readability, which is what
/// the local filesystem can answer portably. Policy beyond that (ACLs,
/// sandbox rules) belongs to a host-supplied checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissionChecker;

impl PermissionChecker for SystemPermissionChecker {
    fn check_operation_permission(
        &self,
        path: &Path,
        class: OperationClass,
    ) -> PermissionDecision {
        match class {
            OperationClass::Read => match fs::metadata(path) {
                Ok(_) => PermissionDecision::allowed(),
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    PermissionDecision::denied(format!("cannot read {}", path.display()))
                }
                // Existence is the gate's concern, not a permission verdict.
                Err(_) => PermissionDecision::allowed(),
            },
            OperationClass::Write => readonly_decision(path, "write into"),
            OperationClass::Delete => {
                // Deleting an entry mutates its parent directory.
                let parent = path.parent().unwrap_or(path);
                readonly_decision(parent, "delete from")
            }
        }
    }
}

fn readonly_decision(path: &Path, verb: &str) -> PermissionDecision {
    match fs::metadata(path) {
        Ok(metadata) if metadata.permissions().readonly() => {
            PermissionDecision::denied(format!("cannot {} read-only {}", verb, path.display()))
        }
        _ => PermissionDecision::allowed(),
    }
}
