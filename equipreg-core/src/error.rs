//! Error types for EQUIPREG.
//!
//! The registry has exactly two domain failures, [`EquipmentError::AlreadyRegistered`]
//! and [`EquipmentError::NotFound`]. Everything else is an infrastructure or
//! boundary failure and is kept in separate variants so callers never confuse
//! a storage outage with a duplicate registration.

use thiserror::Error;

use crate::types::EquipmentId;

/// Result type alias using `EquipmentError`.
pub type Result<T> = std::result::Result<T, EquipmentError>;

/// Main error type for all EQUIPREG operations.
#[derive(Debug, Error)]
pub enum EquipmentError {
    // ═══════════════════════════════════════════════════════════════════════════
    // DOMAIN ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register was called for an id that already holds a record.
    #[error("Equipment with id {0} is already registered")]
    AlreadyRegistered(EquipmentId),

    /// GetDetails was called for an id with no registered record.
    #[error("Equipment with id {0} does not exist")]
    NotFound(EquipmentId),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Caller identity supplied by the transport is unusable.
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backing store is corrupted or unusable.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Journal format version mismatch.
    #[error("Journal version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads and writes
        expected: u8,
        /// Version found in the journal header
        actual: u8,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An event sink could not accept a registration event.
    #[error("Event publish failed: {0}")]
    EventPublishError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EquipmentError {
    /// Returns true for the two registry domain errors.
    ///
    /// Domain errors are final for the given id; retrying cannot change the outcome.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            EquipmentError::AlreadyRegistered(_) | EquipmentError::NotFound(_)
        )
    }

    /// Returns true if the backing store failed.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            EquipmentError::StorageError(_)
                | EquipmentError::IoError(_)
                | EquipmentError::JsonError(_)
                | EquipmentError::VersionMismatch { .. }
        )
    }

    /// Returns true if the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EquipmentError::IoError(_) | EquipmentError::StorageError(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            EquipmentError::ValidationError(_) | EquipmentError::InvalidPrincipal(_)
        )
    }
}
