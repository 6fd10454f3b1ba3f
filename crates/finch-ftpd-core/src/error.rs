//! Error types for the filesystem collaborator.

use thiserror::Error;

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// Failure contract of the [`crate::Filesystem`] collaborator.
///
/// Deliberately independent of FTP reply codes (550/450/…) — translating a
/// `FsError` into the right numeric reply is a concern of the command
/// handlers in `finch-ftpd`, not of the filesystem backend.
#[derive(Error, Debug)]
pub enum FsError {
    /// No entry exists at the given path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks the rights to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The target already exists (e.g. `MKD` on an existing directory).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The entry exists but is not the kind the operation expected
    /// (directory where a file was required, or vice versa).
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Directory is non-empty and the backend refuses to remove it.
    #[error("directory not empty: {0}")]
    NotEmpty(String),

    /// Underlying I/O failure from a real backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for backend-specific failures.
    #[error("{0}")]
    Other(String),
}
