//! The module contains the errors the engine can return.
//!
//! Contention and user mistakes (full activity, duplicate booking, duplicate
//! vote, unknown activity) are *not* errors: they are returned as outcome
//! enums by the store and the engines. What is left here:
//!
//! - [`NotFound`] a referenced record is missing where one is required.
//! - [`PermissionDenied`] a non-administrator asked for a privileged action.
//! - [`ValidationFailed`] input rejected before touching storage.
//! - [`StorageUnavailable`] the database could not be reached.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`PermissionDenied`]: EngineError::PermissionDenied
//!  [`ValidationFailed`]: EngineError::ValidationFailed
//!  [`StorageUnavailable`]: EngineError::StorageUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("Corrupted record: {0}")]
    Corrupted(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    StorageUnavailable(#[from] DbErr),
}

impl EngineError {
    /// Whether the failure is transient infrastructure trouble rather than a
    /// problem with the request itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::Corrupted(a), Self::Corrupted(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::StorageUnavailable(a), Self::StorageUnavailable(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
