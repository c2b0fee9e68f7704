//! Collaborator traits consumed by the operations engine.
//!
//! The engine never touches path validation or permission policy
//! directly; it consumes these seams so a host application can swap in
//! its own rules (sandboxing, network mounts, test doubles).

use std::path::Path;

use serde::{Deserialize, Serialize};

/// The class of filesystem access an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationClass {
    /// Reading file content or listing a directory.
    Read,
    /// Creating entries inside a directory.
    Write,
    /// Removing an entry.
    Delete,
}

impl std::fmt::Display for OperationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Verdict from a [`PermissionChecker`].
#[derive(Debug, Clone)]
pub struct PermissionDecision {
    /// Whether the operation may proceed.
    pub allowed: bool,
    /// Why it was denied, when it was.
    pub reason: Option<String>,
}

impl PermissionDecision {
    /// An allowing decision.
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// A denying decision with a reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Verdict from file name validation.
#[derive(Debug, Clone)]
pub struct NameCheck {
    /// Whether the name is acceptable.
    pub is_valid: bool,
    /// Why it was rejected, when it was.
    pub error: Option<String>,
}

impl NameCheck {
    /// An accepting verdict.
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    /// A rejecting verdict with a reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Path-level queries the engine needs before mutating anything.
pub trait PathValidator: Send + Sync {
    /// Whether an entry exists at `path`.
    fn path_exists(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Validate a single file name (not a path).
    fn validate_file_name(&self, name: &str) -> NameCheck;

    /// Produce a name derived from `name` that is free in `dir`.
    ///
    /// Returns `name` unchanged when it is already free.
    fn generate_unique_file_name(&self, dir: &Path, name: &str) -> String;
}

/// Permission policy the engine consults before mutating anything.
pub trait PermissionChecker: Send + Sync {
    /// Whether `class` access to `path` is permitted.
    fn check_operation_permission(&self, path: &Path, class: OperationClass)
        -> PermissionDecision;
}

/// Validate a file name for cross-platform use.
///
/// Rejects empty and over-long names, path separators, NUL, names
/// reserved by the platform, and leading/trailing whitespace or a
/// trailing dot.
pub fn validate_file_name(name: &str) -> NameCheck {
    if name.is_empty() {
        return NameCheck::rejected("Name cannot be empty");
    }

    if name.len() > 255 {
        return NameCheck::rejected("Name is too long (max 255 characters)");
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return NameCheck::rejected(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return NameCheck::rejected(format!("Name cannot contain '{}'", c));
            }
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper_name = name.to_uppercase();
        let base_name = upper_name.split('.').next().unwrap_or("");
        if reserved.contains(&base_name) {
            return NameCheck::rejected("Reserved filename");
        }
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return NameCheck::rejected("Name cannot start or end with spaces");
    }

    if name.ends_with('.') {
        return NameCheck::rejected("Name cannot end with a dot");
    }

    if name == "." || name == ".." {
        return NameCheck::rejected("'.' and '..' are reserved names");
    }

    NameCheck::ok()
}
