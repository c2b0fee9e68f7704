//! Pre-flight validation for batch operations.
//!
//! Every check here runs before any byte is written. Checks return
//! `Result` rather than panicking or throwing deep in the call chain;
//! the batch scheduler decides what a failure means for the run.

use std::path::Path;
use std::sync::Arc;

use bulkfile_core::{
    ErrorKind, FileOperationError, OperationClass, PathValidator, PermissionChecker,
};

/// Validation gate consulted before any mutating call.
#[derive(Clone)]
pub struct ValidationGate {
    validator: Arc<dyn PathValidator>,
    permissions: Arc<dyn PermissionChecker>,
}

impl ValidationGate {
    /// Create a gate over the given collaborators.
    pub fn new(validator: Arc<dyn PathValidator>, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            validator,
            permissions,
        }
    }

    /// Whole-batch check for a copy/move destination: it must exist,
    /// be a directory, and be writable.
    pub fn check_destination(&self, destination: &Path) -> Result<(), FileOperationError> {
        if !self.validator.path_exists(destination) {
            return Err(FileOperationError::not_found(destination));
        }
        if !self.validator.is_directory(destination) {
            return Err(FileOperationError::new(
                ErrorKind::FileNotFound,
                destination,
                "destination is not a directory",
            ));
        }
        self.check_permission(destination, OperationClass::Write)
    }

    /// Per-item check: the source must exist and the operation's access
    /// class must be permitted on it.
    pub fn check_source(
        &self,
        source: &Path,
        class: OperationClass,
    ) -> Result<(), FileOperationError> {
        if !self.validator.path_exists(source) {
            return Err(FileOperationError::not_found(source));
        }
        self.check_permission(source, class)
    }

    /// Check that a candidate final name passes filename validation.
    pub fn check_name(&self, source: &Path, name: &str) -> Result<(), FileOperationError> {
        let check = self.validator.validate_file_name(name);
        if check.is_valid {
            Ok(())
        } else {
            Err(FileOperationError::invalid_name(
                source,
                check
                    .error
                    .unwrap_or_else(|| format!("'{}' is not a valid file name", name)),
            ))
        }
    }

    fn check_permission(
        &self,
        path: &Path,
        class: OperationClass,
    ) -> Result<(), FileOperationError> {
        let decision = self.permissions.check_operation_permission(path, class);
        if decision.allowed {
            Ok(())
        } else {
            Err(FileOperationError::permission_denied(
                path,
                decision
                    .reason
                    .unwrap_or_else(|| format!("{} access denied", class)),
            ))
        }
    }
}
