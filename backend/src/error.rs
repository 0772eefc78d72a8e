//! Error types for the contact import/export pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`UploadError`] - Upload gating (missing file, wrong extension, too large)
//! - [`ImportError`] - Whole-file failures detected before any row is examined
//! - [`ContactError`] - Single-contact validation failures
//! - [`StorageError`] - Failures from a [`crate::storage::ContactStore`]
//! - [`ConfigError`] - Invalid environment configuration
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP-facing errors
//!
//! Per-row validation failures are *not* errors: they are collected as
//! [`crate::models::RowOutcome::Rejected`] values inside the import summary.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Upload Errors
// =============================================================================

/// Errors raised while gating an uploaded file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// No file part in the request.
    #[error("No file provided")]
    NoFile,

    /// File name does not carry the `.csv` extension.
    #[error("File must be a CSV file")]
    NotCsv,

    /// File is larger than the configured ceiling.
    #[error("File size must not exceed {limit_mb}MB")]
    TooLarge { limit_mb: usize },
}

// =============================================================================
// Import Errors (configuration class)
// =============================================================================

/// Whole-file failures. Nothing is persisted when one of these is raised.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// The file has no non-blank rows at all.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No header cell matches any organisation alias.
    #[error("CSV must have an 'Organisation' column (or similar: {aliases})")]
    MissingOrganisationColumn { aliases: String },
}

// =============================================================================
// Contact Errors
// =============================================================================

/// Validation failures for a single contact created outside of an import.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Organisation is required")]
    OrganisationRequired,

    #[error("Organisation must be at most {max} characters")]
    OrganisationTooLong { max: usize },
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from a contact store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,

    /// The store refused the write.
    #[error("Storage rejected the write: {0}")]
    Rejected(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::import::import_text`] and
/// the contact operations. Storage failures stay distinct from the
/// configuration-class [`ImportError`] so callers never mistake them for
/// a problem with the file.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload gating error.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Configuration-class import error.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Single-contact validation error.
    #[error(transparent)]
    Contact(#[from] ContactError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Whether the caller supplied something invalid (as opposed to the
    /// system failing).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::Storage(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Missing caller identity.
    #[error("Unauthorized")]
    Unauthorized,

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<UploadError> for ServerError {
    fn from(err: UploadError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
