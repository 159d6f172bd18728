//! # Error Types
//!
//! Structured error types for load_core. These errors carry enough context
//! for a caller (human, UI, or service boundary) to understand and fix the
//! problem programmatically.
//!
//! Most engine conditions are *not* errors: unknown impact pairs, unknown
//! threshold categories and dangling load references are silent lookup
//! misses, and observer failures are isolated inside the dispatcher. The
//! only fatal condition of an orchestration run is a configuration error
//! raised before any phase starts.
//!
//! ## Example
//!
//! ```rust
//! use load_core::errors::{EngineError, EngineResult};
//!
//! fn validate_area(area_m2: f64) -> EngineResult<()> {
//!     if area_m2 <= 0.0 {
//!         return Err(EngineError::InvalidInput {
//!             field: "area_m2".to_string(),
//!             value: area_m2.to_string(),
//!             reason: "Area must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for load_core operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Structured error type for engine operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EngineError {
    /// An input value is invalid (out of range, NaN, empty id, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// The building data cannot start an orchestration run
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// A load id was required but is not registered
    #[error("Load not found: {load_id}")]
    LoadNotFound { load_id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        EngineError::MissingField {
            field: field.into(),
        }
    }

    /// Create a Configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a LoadNotFound error
    pub fn load_not_found(load_id: impl Into<String>) -> Self {
        EngineError::LoadNotFound {
            load_id: load_id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is fatal to an orchestration run before any phase starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration { .. } | EngineError::MissingField { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput { .. } => "INVALID_INPUT",
            EngineError::MissingField { .. } => "MISSING_FIELD",
            EngineError::Configuration { .. } => "CONFIGURATION",
            EngineError::LoadNotFound { .. } => "LOAD_NOT_FOUND",
            EngineError::FileError { .. } => "FILE_ERROR",
            EngineError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EngineError::VersionMismatch { .. } => "VERSION_MISMATCH",
            EngineError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SerializationError {
            reason: e.to_string(),
        }
    }
}
