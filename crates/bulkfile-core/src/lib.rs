//! Core types and traits for bulkfile.
//!
//! This crate provides the error taxonomy shared across the bulkfile
//! ecosystem and the collaborator traits the operations engine consumes:
//! path validation and permission checking.

mod access;
mod error;

pub use access::{
    validate_file_name, NameCheck, OperationClass, PathValidator, PermissionChecker,
    PermissionDecision,
};
pub use error::{ErrorKind, FileOperationError};
